//! JSON fixtures for adapter endpoints

use chrono::{DateTime, Duration, DurationRound, SecondsFormat, TimeZone, Utc};
use rstest::fixture;
use serde_json::{Value, json};
use services_common::CandleInterval;

/// RFC3339 with millisecond precision and a `Z` suffix
pub fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fixed base instant for trade fixtures
pub fn trade_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `/info` body declaring `capability`
pub fn info_json(capability: Value) -> Value {
    json!({
        "name": "Example Exchange",
        "description": "An example exchange adapter",
        "logo": "https://example.com/logo.png",
        "website": "https://example.com",
        "twitter": "example",
        "version": "1.0.0",
        "capability": capability
    })
}

/// Every pollable family enabled
pub fn full_capability() -> Value {
    json!({
        "markets": true,
        "trades": true,
        "tradesByTimestamp": true,
        "tradesSocket": false,
        "orders": false,
        "ordersSnapshot": true,
        "ordersSocket": false,
        "candles": true,
        "ticker": true
    })
}

/// `/markets` body with one spot market per id
pub fn markets_json(ids: &[&str]) -> Value {
    Value::Array(
        ids.iter()
            .copied()
            .map(|id| {
                let (base, quote) = id.split_once('-').unwrap_or((id, "USD"));
                json!({
                    "id": id,
                    "base": base.to_uppercase(),
                    "quote": quote.to_uppercase(),
                    "type": "spot",
                    "active": true
                })
            })
            .collect(),
    )
}

/// One trade; `seq` doubles as its id and its minute offset from
/// [`trade_epoch`]
pub fn trade_json(seq: i64) -> Value {
    json!({
        "id": seq.to_string(),
        "timestamp": rfc3339(trade_epoch() + Duration::minutes(seq)),
        "price": format!("{}.50", 100 + seq),
        "amount": "0.25",
        "order": format!("order-{seq}"),
        "type": "market",
        "side": if seq % 2 == 0 { "buy" } else { "sell" }
    })
}

/// Trades page holding `seqs` in order
pub fn trades_page(seqs: &[i64]) -> Value {
    Value::Array(seqs.iter().copied().map(trade_json).collect())
}

/// Sorted order book with numeric levels
pub fn order_book_json() -> Value {
    json!({
        "timestamp": rfc3339(Utc::now().duration_trunc(Duration::seconds(1)).unwrap_or_else(|_| Utc::now())),
        "bids": [[5000.0, 1.0], [4999.5, 2.0], [4990.0, 0.5]],
        "asks": [[5001.0, 1.5], [5002.0, 0.75], [5010.0, 3.0]]
    })
}

/// `count` aligned candles ending at the last completed interval before
/// `now`
pub fn candles_json(interval: CandleInterval, count: usize, now: DateTime<Utc>) -> Value {
    let step = Duration::milliseconds(interval.millis());
    let last = (now - step).duration_trunc(step).unwrap_or(now);
    candles_ending_at(step, count, last)
}

/// `count` candles spaced by `step` with the newest at `last`
pub fn candles_ending_at(step: Duration, count: usize, last: DateTime<Utc>) -> Value {
    Value::Array(
        (0..count)
            .rev()
            .map(|i| {
                let ts = last - step * i as i32;
                json!({
                    "timestamp": rfc3339(ts),
                    "open": "100.0",
                    "high": "110.0",
                    "low": "95.0",
                    "close": "105.0",
                    "volume": "12.5"
                })
            })
            .collect(),
    )
}

/// Consistent ticker
pub fn ticker_json() -> Value {
    json!({
        "close": "5000.5",
        "high": "5100",
        "low": "4900",
        "ask": "5001",
        "bid": "5000",
        "volume": "1234.5",
        "raw": { "last": 5000.5 },
        "timestamp": rfc3339(Utc::now().duration_trunc(Duration::seconds(1)).unwrap_or_else(|_| Utc::now()))
    })
}

/// Bodies served by a mock exchange, one per endpoint
#[derive(Debug, Clone)]
pub struct ExchangeFixture {
    pub info: Value,
    pub markets: Value,
    /// First `/trades` page; its first id is the follow-up cursor
    pub trades: Value,
    /// `/trades` page served for `since=<first id>`
    pub trades_after: Value,
    /// First `/trades-by-timestamp` page; its first timestamp is the cursor
    pub trades_by_timestamp: Value,
    /// `/trades-by-timestamp` page served for `since=<first timestamp>`;
    /// must not repeat the first trade
    pub trades_by_timestamp_after: Value,
    pub order_book: Value,
    pub candles_1d: Value,
    pub candles_1h: Value,
    pub candles_1m: Value,
    pub ticker: Value,
}

impl ExchangeFixture {
    /// An adapter that passes every required check
    pub fn conformant() -> Self {
        let now = Utc::now();
        Self {
            info: info_json(full_capability()),
            markets: markets_json(&["btc-usd"]),
            trades: trades_page(&[1, 2, 3]),
            trades_after: trades_page(&[2, 3, 4]),
            trades_by_timestamp: trades_page(&[1, 2, 3]),
            trades_by_timestamp_after: trades_page(&[2, 3, 4]),
            order_book: order_book_json(),
            candles_1d: candles_json(CandleInterval::OneDay, 7, now),
            candles_1h: candles_json(CandleInterval::OneHour, 24, now),
            candles_1m: candles_json(CandleInterval::OneMinute, 60, now),
            ticker: ticker_json(),
        }
    }

    pub fn candles(&self, interval: CandleInterval) -> &Value {
        match interval {
            CandleInterval::OneDay => &self.candles_1d,
            CandleInterval::OneHour => &self.candles_1h,
            CandleInterval::OneMinute => &self.candles_1m,
        }
    }
}

#[fixture]
pub fn conformant_exchange() -> ExchangeFixture {
    ExchangeFixture::conformant()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_candles_are_aligned_and_fresh() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 12).unwrap();
        let candles = candles_json(CandleInterval::OneHour, 24, now);
        let items = candles.as_array().unwrap();
        assert_eq!(items.len(), 24);
        assert_eq!(items[23]["timestamp"], "2024-03-10T14:00:00.000Z");
        assert_eq!(items[0]["timestamp"], "2024-03-09T15:00:00.000Z");
    }

    #[test]
    fn test_trade_fixture_shape() {
        let trade = trade_json(3);
        assert_eq!(trade["id"], "3");
        assert_eq!(trade["timestamp"], "2024-01-02T10:03:00.000Z");
        assert_eq!(trade["price"], "103.50");
    }
}
