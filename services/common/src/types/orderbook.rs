//! `/orders/snapshot` records

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::parse_numeric;

/// How a snapshot encodes its prices and sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceRepr {
    /// Raw JSON numbers
    Number,
    /// Numeric strings
    NumericString,
}

impl PriceRepr {
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Number(_) => Some(Self::Number),
            Value::String(_) => Some(Self::NumericString),
            _ => None,
        }
    }
}

/// Book side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BookSide {
    Bid,
    Ask,
}

impl BookSide {
    pub fn label(self) -> &'static str {
        match self {
            Self::Bid => "bid",
            Self::Ask => "ask",
        }
    }
}

/// One `[price, size]` level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
    pub repr: PriceRepr,
}

impl BookLevel {
    /// Parse a `[price, size]` pair; both entries must be finite numbers
    /// or numeric strings.
    pub fn from_value(value: &Value) -> Option<Self> {
        let pair = value.as_array()?;
        let (price, size) = (pair.first()?, pair.get(1)?);
        Some(Self {
            price: numeric_value(price)?,
            size: numeric_value(size)?,
            repr: PriceRepr::of(price)?,
        })
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_numeric(s),
        _ => None,
    }
}

/// Order book snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBookSnapshot {
    pub timestamp: DateTime<Utc>,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBookSnapshot {
    pub fn levels(&self, side: BookSide) -> &[BookLevel] {
        match side {
            BookSide::Bid => &self.bids,
            BookSide::Ask => &self.asks,
        }
    }

    /// Representations used by bid and ask prices, in first-seen order
    pub fn price_reprs(&self) -> Vec<PriceRepr> {
        let mut seen = Vec::with_capacity(2);
        for level in self.bids.iter().chain(self.asks.iter()) {
            if !seen.contains(&level.repr) {
                seen.push(level.repr);
            }
        }
        seen
    }
}
