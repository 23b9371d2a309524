//! `/trades` and `/trades-by-timestamp` records

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::trades::EARLIEST_TRADE_YEAR;

/// Executed trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub price: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub amount_quote: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default, rename = "type")]
    pub trade_type: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub raw: Option<Value>,
}

impl Trade {
    /// Earliest plausible trade instant
    pub fn epoch_bound() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(EARLIEST_TRADE_YEAR, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether the trade predates the sanity bound
    pub fn is_before_epoch_bound(&self) -> bool {
        self.timestamp < Self::epoch_bound()
    }
}
