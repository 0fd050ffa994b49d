use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::TITLE_NOT_FOUND;

/// One immutable extraction result for a single fetch cycle.
///
/// `price` is either a non-negative decimal or absent; absence is never
/// encoded as zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSnapshot {
    pub title: String,
    pub price: Option<Decimal>,
    pub source_url: String,
    pub captured_at: DateTime<Utc>,
}

impl ProductSnapshot {
    pub fn new(title: impl Into<String>, price: Option<Decimal>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price: price.filter(|p| !p.is_sign_negative()),
            source_url: source_url.into(),
            captured_at: Utc::now(),
        }
    }

    pub fn has_title(&self) -> bool {
        self.title != TITLE_NOT_FOUND
    }

    /// Title cut to `max_chars` characters, with an ellipsis when shortened.
    pub fn short_title(&self, max_chars: usize) -> String {
        if self.title.chars().count() <= max_chars {
            self.title.clone()
        } else {
            let head: String = self.title.chars().take(max_chars).collect();
            format!("{}...", head)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Snapshot(ProductSnapshot),
    TitleMissing,
    /// No strategy produced a price. The resolved title is kept for diagnostics.
    PriceMissing { title: String },
    FetchFailed(String),
    ParseFailed(String),
}

impl ExtractionResult {
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionResult::Snapshot(_) => "snapshot",
            ExtractionResult::TitleMissing => "title_missing",
            ExtractionResult::PriceMissing { .. } => "price_missing",
            ExtractionResult::FetchFailed(_) => "fetch_failed",
            ExtractionResult::ParseFailed(_) => "parse_failed",
        }
    }

    pub fn snapshot(&self) -> Option<&ProductSnapshot> {
        match self {
            ExtractionResult::Snapshot(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}
