//! `/markets` records

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Market kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    Spot,
    Derivative,
    Index,
    #[serde(other)]
    Unknown,
}

/// Tradable market listed by an adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default, rename = "type")]
    pub market_type: Option<MarketType>,
}

impl Market {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base: None,
            quote: None,
            market_type: None,
        }
    }

    /// Lenient read used to seed downstream validators; entries without a
    /// usable id are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id").and_then(Value::as_str).filter(|s| !s.is_empty())?;
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            id: id.to_string(),
            base: text("base"),
            quote: text("quote"),
            market_type: value
                .get("type")
                .and_then(|t| serde_json::from_value(t.clone()).ok()),
        })
    }

    /// Read every usable market from a `/markets` body, preserving order
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| items.iter().filter_map(Self::from_value).collect())
            .unwrap_or_default()
    }
}
