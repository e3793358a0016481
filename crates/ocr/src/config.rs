use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid parser configuration: {0}")]
    Invalid(String),
}

/// Field order used to read a numeric `a/b/c` date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    DayMonthYear,
    MonthDayYear,
    YearMonthDay,
}

impl std::fmt::Display for DateOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateOrder::DayMonthYear => write!(f, "day_month_year"),
            DateOrder::MonthDayYear => write!(f, "month_day_year"),
            DateOrder::YearMonthDay => write!(f, "year_month_day"),
        }
    }
}

impl std::str::FromStr for DateOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dmy" | "day_month_year" => Ok(DateOrder::DayMonthYear),
            "mdy" | "month_day_year" => Ok(DateOrder::MonthDayYear),
            "ymd" | "year_month_day" => Ok(DateOrder::YearMonthDay),
            other => Err(format!("Unknown date order: '{other}'")),
        }
    }
}

/// A phrase that marks the line carrying the receipt total, with the
/// confidence a total found next to it earns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnchorKeyword {
    pub phrase: String,
    pub confidence: f32,
}

impl AnchorKeyword {
    pub fn new(phrase: &str, confidence: f32) -> Self {
        Self { phrase: phrase.to_string(), confidence }
    }
}

/// Read-only parser configuration. Built once and handed to
/// [`crate::ReceiptParser::new`]; every parse reads it, none mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Tried in order; the first order yielding a valid calendar date wins.
    pub date_orders: Vec<DateOrder>,
    pub date_keywords: Vec<String>,
    pub total_anchors: Vec<AnchorKeyword>,
    pub subtotal_keywords: Vec<String>,
    pub tax_keywords: Vec<String>,
    pub discount_keywords: Vec<String>,
    /// Lines containing one of these never become line items.
    pub excluded_item_keywords: Vec<String>,
    /// How many leading lines the merchant extractor considers.
    pub merchant_scan_lines: usize,
    pub merchant_max_chars: usize,
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            date_orders: vec![
                DateOrder::MonthDayYear,
                DateOrder::DayMonthYear,
                DateOrder::YearMonthDay,
            ],
            date_keywords: strings(&["date", "dated", "fecha", "datum", "data"]),
            total_anchors: vec![
                AnchorKeyword::new("grand total", 0.95),
                AnchorKeyword::new("total due", 0.90),
                AnchorKeyword::new("amount due", 0.90),
                AnchorKeyword::new("total", 0.85),
                AnchorKeyword::new("balance due", 0.80),
                AnchorKeyword::new("balance", 0.80),
                AnchorKeyword::new("amount", 0.70),
            ],
            subtotal_keywords: strings(&["subtotal", "sub total", "sub-total"]),
            tax_keywords: strings(&["tax", "sales tax", "vat", "gst", "hst", "pst"]),
            discount_keywords: strings(&["discount", "coupon", "savings", "promo"]),
            excluded_item_keywords: strings(&[
                "change", "cash", "tendered", "card", "visa", "mastercard", "amex", "debit",
            ]),
            merchant_scan_lines: 3,
            merchant_max_chars: 50,
        }
    }
}

impl ParserConfig {
    /// Parse a TOML document; keys left out keep their defaults.
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: ParserConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.date_orders.is_empty() {
            return Err(ConfigError::Invalid("date_orders must not be empty".into()));
        }
        for anchor in &self.total_anchors {
            if anchor.phrase.trim().is_empty() {
                return Err(ConfigError::Invalid("total anchor phrase is empty".into()));
            }
            if !(0.0..=1.0).contains(&anchor.confidence) {
                return Err(ConfigError::Invalid(format!(
                    "confidence {} for anchor '{}' is outside 0.0..=1.0",
                    anchor.confidence, anchor.phrase
                )));
            }
        }
        if self.merchant_scan_lines == 0 {
            return Err(ConfigError::Invalid("merchant_scan_lines must be at least 1".into()));
        }
        if self.merchant_max_chars == 0 {
            return Err(ConfigError::Invalid("merchant_max_chars must be at least 1".into()));
        }
        Ok(())
    }
}
