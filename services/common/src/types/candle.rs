//! `/candles` records and the interval table

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::parse_numeric;
use crate::constants::time::{DAY_MS, HOUR_MS, MINUTE_MS};

/// Candle interval served at `/candles?interval=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1m")]
    OneMinute,
}

impl CandleInterval {
    pub const ALL: [Self; 3] = [Self::OneDay, Self::OneHour, Self::OneMinute];

    pub fn code(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::OneHour => "1h",
            Self::OneMinute => "1m",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.code() == code)
    }

    /// Interval length in milliseconds; timestamps must be multiples of it
    pub fn millis(self) -> i64 {
        match self {
            Self::OneDay => DAY_MS,
            Self::OneHour => HOUR_MS,
            Self::OneMinute => MINUTE_MS,
        }
    }

    /// Minimum number of candles a series must hold
    pub fn min_points(self) -> usize {
        match self {
            Self::OneDay => 7,
            Self::OneHour => 24,
            Self::OneMinute => 60,
        }
    }

    /// Maximum staleness of the most recent candle
    pub fn freshness_window(self) -> Duration {
        match self {
            Self::OneDay => Duration::days(2),
            Self::OneHour => Duration::hours(2),
            Self::OneMinute => Duration::minutes(10),
        }
    }

    /// Human wording of the freshness window, used in failure messages
    pub fn freshness_label(self) -> &'static str {
        match self {
            Self::OneDay => "48 hours",
            Self::OneHour => "2 hours",
            Self::OneMinute => "10 minutes",
        }
    }

    /// Alignment unit wording, used in failure messages
    pub fn unit_label(self) -> &'static str {
        match self {
            Self::OneDay => "day",
            Self::OneHour => "hour",
            Self::OneMinute => "minute",
        }
    }

    /// Whether `ts` sits exactly on an interval boundary in UTC
    pub fn is_aligned(self, ts: &DateTime<Utc>) -> bool {
        ts.timestamp_millis().rem_euclid(self.millis()) == 0
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// OHLCV candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub volume_quote: Option<String>,
}

/// Parsed OHLC prices of one candle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn ohlc(&self) -> Option<Ohlc> {
        Some(Ohlc {
            open: parse_numeric(&self.open)?,
            high: parse_numeric(&self.high)?,
            low: parse_numeric(&self.low)?,
            close: parse_numeric(&self.close)?,
        })
    }

    /// Base volume when present, otherwise quote volume
    pub fn effective_volume(&self) -> Option<f64> {
        self.volume
            .as_deref()
            .or(self.volume_quote.as_deref())
            .and_then(parse_numeric)
    }
}
