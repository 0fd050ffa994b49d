use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use crate::models::{ExtractionResult, ProductSnapshot, TITLE_NOT_FOUND};
use crate::price_parser::PriceParser;
use crate::scraper::PageFetcher;
use crate::utils::error::{AppError, Result, panic_reason};

/// CSS locators consulted by the extractor, in priority order.
#[derive(Debug, Clone)]
pub struct Locators {
    pub title: Vec<String>,
    pub price_whole: String,
    pub price_fraction: String,
    pub single_price: Vec<String>,
}

impl Default for Locators {
    fn default() -> Self {
        Locators {
            title: vec![
                "span#productTitle".to_string(),
                "h1.a-size-large".to_string(),
                "h1.a-size-medium".to_string(),
            ],
            price_whole: ".a-price-whole".to_string(),
            price_fraction: ".a-price-fraction".to_string(),
            single_price: vec![
                ".a-price-range".to_string(),
                ".a-offscreen".to_string(),
                ".a-price.a-text-price.a-size-medium.a-color-price".to_string(),
                ".a-price-whole".to_string(),
            ],
        }
    }
}

type PriceStrategy = fn(&ProductExtractor, &Html) -> Result<Decimal>;

/// Price strategies, tried in order; the first success wins.
const PRICE_CASCADE: &[(&'static str, PriceStrategy)] = &[
    ("compound", ProductExtractor::compound_price),
    ("single_element", ProductExtractor::single_element_price),
    ("text_scan", ProductExtractor::text_scan_price),
];

pub struct ProductExtractor {
    parser: PriceParser,
    title_locators: Vec<(String, Selector)>,
    whole_locator: Selector,
    fraction_locator: Selector,
    price_locators: Vec<(String, Selector)>,
    currency_text_regex: Regex,
    cascade: &'static [(&'static str, PriceStrategy)],
    require_title: bool,
}

impl ProductExtractor {
    pub fn new() -> Result<Self> {
        Self::with_locators(&Locators::default(), false)
    }

    pub fn with_locators(locators: &Locators, require_title: bool) -> Result<Self> {
        Ok(Self {
            parser: PriceParser::new(),
            title_locators: compile_all(&locators.title)?,
            whole_locator: compile(&locators.price_whole)?,
            fraction_locator: compile(&locators.price_fraction)?,
            price_locators: compile_all(&locators.single_price)?,
            currency_text_regex: Regex::new(r"[₹$€£¥]\s*\d[\d,]*(?:\.\d+)?")
                .map_err(|e| AppError::Internal(format!("Invalid currency pattern: {}", e)))?,
            cascade: PRICE_CASCADE,
            require_title,
        })
    }

    /// Fetch `url` through `fetcher` and extract it. Transport failures come
    /// back as `FetchFailed`; nothing is propagated.
    pub async fn fetch_and_extract(
        &self,
        fetcher: &dyn PageFetcher,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> ExtractionResult {
        match fetcher.fetch(url, headers).await {
            Ok(body) => self.extract(&body, url),
            Err(e) => {
                tracing::warn!("Fetch of {} failed: {}", url, e);
                ExtractionResult::FetchFailed(e.to_string())
            }
        }
    }

    pub fn extract(&self, raw_document: &[u8], source_url: &str) -> ExtractionResult {
        let html = String::from_utf8_lossy(raw_document);
        if html.trim().is_empty() {
            return ExtractionResult::ParseFailed("empty document".to_string());
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.extract_document(&html, source_url))) {
            Ok(result) => result,
            Err(payload) => {
                let reason = panic_reason(payload.as_ref());
                tracing::error!("Extraction of {} aborted: {}", source_url, reason);
                ExtractionResult::ParseFailed(reason)
            }
        }
    }

    fn extract_document(&self, html: &str, source_url: &str) -> ExtractionResult {
        let document = Html::parse_document(html);

        let title = match self.resolve_title(&document) {
            Some(title) => title,
            None if self.require_title => {
                tracing::warn!("No title locator matched on {}", source_url);
                return ExtractionResult::TitleMissing;
            }
            None => {
                tracing::debug!("No title locator matched on {}, using sentinel", source_url);
                TITLE_NOT_FOUND.to_string()
            }
        };

        match self.resolve_price(&document) {
            Some(price) => ExtractionResult::Snapshot(ProductSnapshot::new(title, Some(price), source_url)),
            None => {
                tracing::warn!("Every price strategy failed on {}", source_url);
                ExtractionResult::PriceMissing { title }
            }
        }
    }

    fn resolve_title(&self, document: &Html) -> Option<String> {
        self.title_locators.iter().find_map(|(name, selector)| {
            let text = document.select(selector).next().map(element_text)?;
            if text.is_empty() {
                tracing::debug!("Title locator {} matched an empty element", name);
                None
            } else {
                Some(text)
            }
        })
    }

    fn resolve_price(&self, document: &Html) -> Option<Decimal> {
        self.cascade.iter().find_map(|(name, strategy)| match strategy(self, document) {
            Ok(price) => {
                tracing::debug!("Price strategy {} resolved {}", name, price);
                Some(price)
            }
            Err(e) => {
                tracing::debug!("Price strategy {} failed: {}", name, e);
                None
            }
        })
    }

    /// Split widgets render the integer and fractional digits separately.
    fn compound_price(&self, document: &Html) -> Result<Decimal> {
        let whole = document
            .select(&self.whole_locator)
            .next()
            .map(element_text)
            .ok_or_else(|| AppError::structure("compound", "whole part not found"))?;
        let fraction = document
            .select(&self.fraction_locator)
            .next()
            .map(element_text)
            .ok_or_else(|| AppError::structure("compound", "fraction part not found"))?;

        let whole = whole.trim_end_matches('.');
        self.parser.try_parse(&format!("{}.{}", whole, fraction))
    }

    fn single_element_price(&self, document: &Html) -> Result<Decimal> {
        let mut last_error = AppError::structure("single_element", "no locator matched");

        for (name, selector) in &self.price_locators {
            let Some(element) = document.select(selector).next() else {
                continue;
            };
            match self.parser.try_parse(&element_text(element)) {
                Ok(price) => return Ok(price),
                Err(e) => {
                    tracing::debug!("Locator {} matched but did not parse: {}", name, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    fn text_scan_price(&self, document: &Html) -> Result<Decimal> {
        text_nodes(document)
            .flat_map(|text| self.currency_text_regex.find_iter(text))
            .find_map(|m| self.parser.parse(m.as_str()))
            .ok_or_else(|| AppError::structure("text_scan", "no currency-prefixed amount in page text"))
    }
}

fn compile(locator: &str) -> Result<Selector> {
    Selector::parse(locator)
        .map_err(|e| AppError::Validation(format!("Invalid CSS selector '{}': {:?}", locator, e)))
}

fn compile_all(locators: &[String]) -> Result<Vec<(String, Selector)>> {
    locators
        .iter()
        .map(|locator| compile(locator).map(|selector| (locator.clone(), selector)))
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Every text node outside `<script>` and `<style>`.
fn text_nodes(document: &Html) -> impl Iterator<Item = &str> + '_ {
    document.root_element().descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let parent = node.parent().and_then(|p| p.value().as_element().map(|e| e.name()));
        match parent {
            Some("script") | Some("style") => None,
            _ => Some(&**text),
        }
    })
}
