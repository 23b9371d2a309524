//! `/orders/snapshot` order book checks

use async_trait::async_trait;
use serde_json::Value;
use services_common::{
    AssertionError, AuditError, BookLevel, BookSide, Market, OrderBookSnapshot,
};

use super::{MarketAudit, MarketOutcome, Validator, first_conforming_market, timestamp_of};
use crate::assertions::{AssertOpts, Asserter, to_json};
use crate::capability::EndpointFamily;
use crate::context::AuditContext;
use crate::result::AuditResult;

/// Validate snapshot shape and level encoding
pub fn check_order_book(au: &Asserter<'_>, body: &Value) -> Result<OrderBookSnapshot, AssertionError> {
    au.timestamp_property(body, "timestamp", AssertOpts::REQUIRED)?;
    au.array_property(body, "bids", AssertOpts::REQUIRED)?;
    au.array_property(body, "asks", AssertOpts::REQUIRED)?;

    let book = OrderBookSnapshot {
        timestamp: timestamp_of(au, body, "timestamp")?,
        bids: parse_levels(au, body, BookSide::Bid)?,
        asks: parse_levels(au, body, BookSide::Ask)?,
    };
    au.ensure(
        book.price_reprs().len() <= 1,
        "Expect ask prices and bid prices to be of the same type",
    )?;
    Ok(book)
}

fn parse_levels(
    au: &Asserter<'_>,
    body: &Value,
    side: BookSide,
) -> Result<Vec<BookLevel>, AssertionError> {
    let key = match side {
        BookSide::Bid => "bids",
        BookSide::Ask => "asks",
    };
    au.array(&body[key], key)?
        .iter()
        .map(|level| {
            BookLevel::from_value(level).ok_or_else(|| {
                au.fail(format!(
                    "Expect {} price and amount to be of type number or numeric string: {}",
                    side.label(),
                    to_json(level)
                ))
            })
        })
        .collect()
}

/// Bids descend and asks ascend by price; equal neighbours are allowed.
///
/// Prices are compared as parsed numbers whether the adapter sent JSON
/// numbers or numeric strings, so `"9.5"` sorts below `"10.0"`.
pub fn check_book_sorted(au: &Asserter<'_>, book: &OrderBookSnapshot) -> Result<(), AssertionError> {
    for side in [BookSide::Bid, BookSide::Ask] {
        let prices: Vec<f64> = book.levels(side).iter().map(|l| l.price).collect();
        let mut sorted = prices.clone();
        match side {
            BookSide::Bid => sorted.sort_by(|a, b| b.total_cmp(a)),
            BookSide::Ask => sorted.sort_by(|a, b| a.total_cmp(b)),
        }
        au.ensure_with(prices == sorted, || match side {
            BookSide::Bid => "Expected bids to be sorted by price descending".to_string(),
            BookSide::Ask => "Expected asks to be sorted by price ascending".to_string(),
        })?;
    }
    Ok(())
}

/// Audits `/orders/snapshot`
pub struct OrdersSnapshotValidator;

#[async_trait]
impl MarketAudit for OrdersSnapshotValidator {
    fn family(&self) -> EndpointFamily {
        EndpointFamily::OrdersSnapshot
    }

    async fn audit_market(
        &self,
        ctx: &AuditContext,
        market: &Market,
    ) -> Result<MarketOutcome, AuditError> {
        let response = ctx
            .fetcher()
            .get_with_query("/orders/snapshot", &[("market", market.id.as_str())])
            .await?;
        let au = Asserter::new(&response.url);
        let book = check_order_book(&au, &response.body)?;
        check_book_sorted(&au, &book)?;
        Ok(MarketOutcome::Conforms(format!(
            "/orders/snapshot is well-formed and sorted for market={}",
            market.id
        )))
    }
}

#[async_trait]
impl Validator for OrdersSnapshotValidator {
    fn family(&self) -> EndpointFamily {
        EndpointFamily::OrdersSnapshot
    }

    async fn validate(&self, ctx: &mut AuditContext) -> Vec<AuditResult> {
        first_conforming_market(self, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn au() -> Asserter<'static> {
        Asserter::new("http://localhost:3000/orders/snapshot?market=btc-usd")
    }

    fn book(bids: Value, asks: Value) -> Value {
        json!({ "timestamp": "2024-01-02T10:00:00.000Z", "bids": bids, "asks": asks })
    }

    fn audit(body: &Value) -> Result<(), AssertionError> {
        let book = check_order_book(&au(), body)?;
        check_book_sorted(&au(), &book)
    }

    #[test]
    fn test_sorted_numeric_book_passes() {
        let body = book(json!([[5000.0, 1.0], [4999.0, 2.0]]), json!([[5001.0, 1.0], [5002.0, 3.0]]));
        assert_eq!(audit(&body), Ok(()));
    }

    #[test]
    fn test_numeric_string_book_sorts_numerically() {
        let body = book(json!([["10.5", "1"], ["9.75", "2"]]), json!([["11", "1"], ["100", "1"]]));
        assert_eq!(audit(&body), Ok(()));
    }

    #[test]
    fn test_equal_neighbours_are_allowed() {
        let body = book(json!([[5000, 1], [5000, 2]]), json!([[5001, 1], [5001, 2]]));
        assert_eq!(audit(&body), Ok(()));
    }

    #[test]
    fn test_inverted_bids_fail() {
        let body = book(json!([[4999.0, 1.0], [5000.0, 2.0]]), json!([[5001.0, 1.0]]));
        assert_eq!(audit(&body).unwrap_err().message, "Expected bids to be sorted by price descending");
    }

    #[test]
    fn test_inverted_asks_fail() {
        let body = book(json!([[5000.0, 1.0]]), json!([[5002.0, 1.0], [5001.0, 1.0]]));
        assert_eq!(audit(&body).unwrap_err().message, "Expected asks to be sorted by price ascending");
    }

    #[test]
    fn test_mixed_representations_fail() {
        let body = book(json!([[5000.0, 1.0]]), json!([["5001", "1"]]));
        assert_eq!(
            audit(&body).unwrap_err().message,
            "Expect ask prices and bid prices to be of the same type"
        );
    }

    #[test]
    fn test_malformed_level_fails() {
        let body = book(json!([["abc", "1"]]), json!([]));
        assert!(audit(&body).unwrap_err().message.starts_with("Expect bid price and amount"));
    }

    #[test]
    fn test_missing_sides_fail() {
        let err = audit(&json!({ "timestamp": "2024-01-02T10:00:00.000Z", "bids": [] })).unwrap_err();
        assert!(err.message.starts_with("Expected 'asks' key"));
    }

    #[test]
    fn test_empty_book_passes() {
        assert_eq!(audit(&book(json!([]), json!([]))), Ok(()));
    }
}
