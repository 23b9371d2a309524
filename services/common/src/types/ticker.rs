//! `/ticker` records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::parse_optional_numeric;

/// Latest summary statistics for one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub close: String,
    #[serde(default)]
    pub ask: Option<String>,
    #[serde(default)]
    pub bid: Option<String>,
    #[serde(default)]
    pub high: Option<String>,
    #[serde(default)]
    pub low: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub volume_quote: Option<String>,
    pub raw: Value,
    pub timestamp: DateTime<Utc>,
}

/// Parsed ticker prices; optional wire fields stay optional
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickerPrices {
    pub close: Option<f64>,
    pub ask: Option<f64>,
    pub bid: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

impl Ticker {
    pub fn prices(&self) -> TickerPrices {
        TickerPrices {
            close: parse_optional_numeric(Some(&self.close)),
            ask: parse_optional_numeric(self.ask.as_deref()),
            bid: parse_optional_numeric(self.bid.as_deref()),
            high: parse_optional_numeric(self.high.as_deref()),
            low: parse_optional_numeric(self.low.as_deref()),
        }
    }

    /// Base volume when present, otherwise quote volume
    pub fn effective_volume(&self) -> Option<f64> {
        parse_optional_numeric(self.volume.as_deref().or(self.volume_quote.as_deref()))
    }
}
