use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::utils::error::{AppError, Result};

/// Currency markers removed before tokenizing. Longer markers come first so
/// `US$` is consumed before `$`.
const CURRENCY_MARKERS: &[&str] = &["US$", "USD", "INR", "Rs.", "Rs", "₹", "$", "€", "£", "¥"];

/// Turns raw text fragments into prices.
///
/// Tie-break: when a fragment holds several numbers (a range such as
/// `₹1,299 - ₹1,499`), the first one wins.
#[derive(Debug, Clone)]
pub struct PriceParser {
    number_regex: Regex,
}

impl Default for PriceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceParser {
    pub fn new() -> Self {
        PriceParser {
            // A digit group may carry `,` grouping anywhere between digits
            // (`1,32,900` and `132,900` alike) and one optional fraction.
            number_regex: Regex::new(r"\d(?:[\d,]*\d)?(?:\.\d+)?").expect("static price pattern"),
        }
    }

    /// Parse `text` into a price; absent on any failure.
    pub fn parse(&self, text: &str) -> Option<Decimal> {
        self.try_parse(text).ok()
    }

    pub fn try_parse(&self, text: &str) -> Result<Decimal> {
        let cleaned = Self::strip_currency(text);
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err(AppError::NumericFormat { text: text.to_string() });
        }

        let token = self
            .number_regex
            .find(cleaned)
            .ok_or_else(|| AppError::NumericFormat { text: text.to_string() })?;

        let digits = token.as_str().replace(',', "");
        Decimal::from_str(&digits).map_err(|_| AppError::NumericFormat { text: text.to_string() })
    }

    /// Replace every currency marker with a space. Markers are never deleted
    /// outright, so `$10$20` cannot collapse into `1020`.
    fn strip_currency(text: &str) -> String {
        CURRENCY_MARKERS
            .iter()
            .fold(text.to_string(), |acc, marker| acc.replace(marker, " "))
    }
}
