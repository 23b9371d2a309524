//! `/ticker` summary checks

use async_trait::async_trait;
use serde_json::Value;
use services_common::{AssertionError, AuditError, Market, Ticker};

use super::{MarketAudit, MarketOutcome, Validator, first_conforming_market, typed};
use crate::assertions::{AssertOpts, Asserter};
use crate::capability::EndpointFamily;
use crate::context::AuditContext;
use crate::result::AuditResult;

/// Field checks; returns the typed ticker
pub fn check_ticker(au: &Asserter<'_>, market_id: &str, body: &Value) -> Result<Ticker, AssertionError> {
    au.ensure_with(body.is_object(), || {
        format!("Expected a ticker response for market {market_id}")
    })?;
    au.numeric_string_property(body, "close", AssertOpts::REQUIRED)?;
    au.numeric_string_property(body, "high", AssertOpts::OPTIONAL)?;
    au.numeric_string_property(body, "low", AssertOpts::OPTIONAL)?;
    au.numeric_string_property(body, "ask", AssertOpts::OPTIONAL)?;
    au.numeric_string_property(body, "bid", AssertOpts::OPTIONAL)?;
    au.property(body, "raw", AssertOpts::REQUIRED)?;
    au.timestamp_property(body, "timestamp", AssertOpts::REQUIRED)?;
    let volume = au.numeric_string_either(body, "volume", "volume_quote")?;
    au.ensure(volume >= 0.0, "Expected volume to be greater than or equal to 0")?;
    typed(au, "ticker", body)
}

/// Price sanity: positive prices, bid below ask, close within [low, high]
pub fn check_ticker_bounds(au: &Asserter<'_>, ticker: &Ticker) -> Result<(), AssertionError> {
    let p = ticker.prices();
    let close = p.close.unwrap_or_default();

    if let (Some(bid), Some(ask)) = (p.bid, p.ask) {
        au.ensure_with(bid < ask, || {
            format!("Expected ask ({ask}) to be greater than bid ({bid})")
        })?;
    }
    if let Some(ask) = p.ask {
        au.ensure(ask > 0.0, "Expected ask to be greater than zero")?;
    }
    if let Some(bid) = p.bid {
        au.ensure(bid > 0.0, "Expected bid to be greater than zero")?;
    }
    if let Some(high) = p.high {
        au.ensure_with(high > 0.0, || format!("Expected high ({high}) to be greater than zero"))?;
        au.ensure_with(close <= high, || {
            format!("Expected close ({close}) to be less than or equal to high ({high})")
        })?;
    }
    if let Some(low) = p.low {
        au.ensure_with(low > 0.0, || format!("Expected low ({low}) to be greater than zero"))?;
        au.ensure_with(close >= low, || {
            format!("Expected close ({close}) to be greater than or equal to low ({low})")
        })?;
    }
    if let (Some(high), Some(low)) = (p.high, p.low) {
        au.ensure_with(high >= low, || {
            format!("Expected high ({high}) to be higher than or equal to low ({low})")
        })?;
    }
    au.ensure_with(close > 0.0, || format!("Expected close ({close}) to be greater than zero"))
}

/// Audits `/ticker`
pub struct TickerValidator;

#[async_trait]
impl MarketAudit for TickerValidator {
    fn family(&self) -> EndpointFamily {
        EndpointFamily::Ticker
    }

    async fn audit_market(
        &self,
        ctx: &AuditContext,
        market: &Market,
    ) -> Result<MarketOutcome, AuditError> {
        let response = ctx
            .fetcher()
            .get_with_query("/ticker", &[("market", market.id.as_str())])
            .await?;
        let au = Asserter::new(&response.url);
        let ticker = check_ticker(&au, &market.id, &response.body)?;
        check_ticker_bounds(&au, &ticker)?;
        Ok(MarketOutcome::Conforms(format!(
            "/ticker is consistent for market={}",
            market.id
        )))
    }
}

#[async_trait]
impl Validator for TickerValidator {
    fn family(&self) -> EndpointFamily {
        EndpointFamily::Ticker
    }

    async fn validate(&self, ctx: &mut AuditContext) -> Vec<AuditResult> {
        first_conforming_market(self, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn au() -> Asserter<'static> {
        Asserter::new("http://localhost:3000/ticker?market=btc-usd")
    }

    fn ticker() -> Value {
        json!({
            "close": "100",
            "high": "110",
            "low": "90",
            "ask": "100.5",
            "bid": "99.5",
            "volume": "12.5",
            "raw": {},
            "timestamp": "2024-01-02T10:00:00.000Z"
        })
    }

    fn audit(body: &Value) -> Result<(), AssertionError> {
        let t = check_ticker(&au(), "btc-usd", body)?;
        check_ticker_bounds(&au(), &t)
    }

    #[test]
    fn test_consistent_ticker_passes() {
        assert_eq!(audit(&ticker()), Ok(()));
    }

    #[test]
    fn test_null_ticker_fails() {
        let err = audit(&Value::Null).unwrap_err();
        assert_eq!(err.message, "Expected a ticker response for market btc-usd");
    }

    #[rstest]
    #[case("bid", "101", "Expected ask (100.5) to be greater than bid (101)")]
    #[case("close", "120", "Expected close (120) to be less than or equal to high (110)")]
    #[case("close", "80", "Expected close (80) to be greater than or equal to low (90)")]
    #[case("low", "115", "Expected close (100) to be greater than or equal to low (115)")]
    fn test_bound_violations(#[case] field: &str, #[case] value: &str, #[case] expected: &str) {
        let mut body = ticker();
        body[field] = json!(value);
        assert_eq!(audit(&body).unwrap_err().message, expected);
    }

    #[test]
    fn test_raw_and_timestamp_required() {
        let mut body = ticker();
        body.as_object_mut().unwrap().remove("raw");
        assert!(audit(&body).unwrap_err().message.starts_with("Expected 'raw' key"));

        let mut body = ticker();
        body.as_object_mut().unwrap().remove("timestamp");
        assert!(audit(&body).unwrap_err().message.starts_with("Expected 'timestamp' key"));
    }

    #[test]
    fn test_quote_volume_only() {
        let mut body = ticker();
        body.as_object_mut().unwrap().remove("volume");
        body["volume_quote"] = json!("1250");
        assert_eq!(audit(&body), Ok(()));
    }
}
