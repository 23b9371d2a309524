//! `/info` identity and capability records

use super::candle::CandleInterval;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Candle support declared by an adapter: a flag or the supported intervals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandleCapability {
    Flag(bool),
    Intervals(Vec<String>),
}

impl Default for CandleCapability {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl CandleCapability {
    /// Whether any candle interval is served
    pub fn is_enabled(&self) -> bool {
        !self.intervals().is_empty()
    }

    /// Known intervals to audit, in canonical order
    pub fn intervals(&self) -> Vec<CandleInterval> {
        match self {
            Self::Flag(true) => CandleInterval::ALL.to_vec(),
            Self::Flag(false) => Vec::new(),
            Self::Intervals(codes) => CandleInterval::ALL
                .iter()
                .copied()
                .filter(|i| codes.iter().any(|c| c == i.code()))
                .collect(),
        }
    }
}

/// Endpoint families an adapter declares support for.
///
/// Absent or malformed flags read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Capability {
    pub markets: bool,
    pub trades: bool,
    pub trades_by_timestamp: bool,
    pub trades_socket: bool,
    pub orders: bool,
    pub orders_snapshot: bool,
    pub orders_socket: bool,
    pub ticker: bool,
    pub candles: CandleCapability,
}

impl Capability {
    /// Lenient read of a `capability` object
    pub fn from_value(value: &Value) -> Self {
        let flag = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or(false);
        let candles = match value.get("candles") {
            Some(Value::Bool(b)) => CandleCapability::Flag(*b),
            Some(Value::Array(items)) => CandleCapability::Intervals(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => CandleCapability::default(),
        };

        Self {
            markets: flag("markets"),
            trades: flag("trades"),
            trades_by_timestamp: flag("tradesByTimestamp"),
            trades_socket: flag("tradesSocket"),
            orders: flag("orders"),
            orders_snapshot: flag("ordersSnapshot"),
            orders_socket: flag("ordersSocket"),
            ticker: flag("ticker"),
            candles,
        }
    }

    /// At least one polling or streaming data family is enabled
    pub fn has_data_capability(&self) -> bool {
        self.trades
            || self.trades_by_timestamp
            || self.orders
            || self.orders_snapshot
            || self.ticker
            || self.candles.is_enabled()
    }

    /// Market-scoped families declared while `markets` is off
    pub fn orphaned_market_families(&self) -> Vec<&'static str> {
        if self.markets {
            return Vec::new();
        }
        let mut orphaned = Vec::new();
        if self.trades {
            orphaned.push("trades");
        }
        if self.trades_by_timestamp {
            orphaned.push("tradesByTimestamp");
        }
        if self.orders_snapshot {
            orphaned.push("ordersSnapshot");
        }
        if self.candles.is_enabled() {
            orphaned.push("candles");
        }
        if self.ticker {
            orphaned.push("ticker");
        }
        orphaned
    }
}

/// Adapter identity metadata served at `/info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub location: Option<String>,
    pub version: Option<String>,
    pub capability: Option<Capability>,
}

impl Info {
    /// Lenient read of an `/info` body; the capability snapshot survives
    /// even when identity fields are malformed.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            name: text("name").unwrap_or_default(),
            description: text("description"),
            logo: text("logo"),
            website: text("website"),
            twitter: text("twitter"),
            location: text("location"),
            version: text("version"),
            capability: value
                .get("capability")
                .filter(|c| c.is_object())
                .map(Capability::from_value),
        }
    }
}
