//! Endpoint validators and the suite runner

pub mod candles;
pub mod info;
pub mod markets;
pub mod orders;
pub mod ticker;
pub mod trades;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use services_common::{AssertionError, AuditError, Market};
use tracing::{debug, info, warn};

use crate::assertions::{Asserter, to_json};
use crate::capability::{self, EndpointFamily};
use crate::context::AuditContext;
use crate::result::AuditResult;

pub use candles::CandlesValidator;
pub use info::InfoValidator;
pub use markets::MarketsValidator;
pub use orders::OrdersSnapshotValidator;
pub use ticker::TickerValidator;
pub use trades::{TradesByTimestampValidator, TradesValidator};

/// One endpoint family's conformance checks
#[async_trait]
pub trait Validator: Send + Sync {
    fn family(&self) -> EndpointFamily;

    /// Run every check and return the results; never aborts the run
    async fn validate(&self, ctx: &mut AuditContext) -> Vec<AuditResult>;
}

/// Outcome of auditing one market
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketOutcome {
    /// Market conforms; carries the pass message
    Conforms(String),
    /// Adapter answered `410 Gone`: no history for this market
    NoHistory,
}

/// Validator that audits one market at a time
#[async_trait]
pub trait MarketAudit: Send + Sync {
    fn family(&self) -> EndpointFamily;

    async fn audit_market(
        &self,
        ctx: &AuditContext,
        market: &Market,
    ) -> Result<MarketOutcome, AuditError>;
}

/// Try markets in order until one conforms.
///
/// Failures on earlier markets are logged and skipped; a failure on the
/// final market becomes the validator's required failure. A `410 Gone` on
/// the final market is only a warning when no market failed outright,
/// otherwise the most recent real failure is reported. An empty market list
/// yields no results since `/markets` reports that itself.
pub async fn first_conforming_market<V>(validator: &V, ctx: &AuditContext) -> Vec<AuditResult>
where
    V: MarketAudit + ?Sized,
{
    let family = validator.family();
    let markets = ctx.markets();
    let Some(last) = markets.len().checked_sub(1) else {
        debug!(%family, "No markets to audit");
        return Vec::new();
    };

    let mut last_failure: Option<(&Market, AuditError)> = None;
    for (i, market) in markets.iter().enumerate() {
        match validator.audit_market(ctx, market).await {
            Ok(MarketOutcome::Conforms(message)) => {
                info!(%family, market = %market.id, "Market conforms");
                return vec![AuditResult::pass(true, message)];
            }
            Ok(MarketOutcome::NoHistory) => {
                info!(%family, market = %market.id, "Market has no historical data (410)");
                if i == last {
                    return match last_failure {
                        Some((failed, err)) => vec![market_failure(family, failed, &err)],
                        None => vec![AuditResult::fail(
                            false,
                            format!("{family} returned 410 Gone for market={}; no historical data to audit", market.id),
                        )],
                    };
                }
            }
            Err(err) => {
                warn!(%family, market = %market.id, url = err.url().unwrap_or("-"), "FAILED: {err}");
                if i == last {
                    return vec![market_failure(family, market, &err)];
                }
                last_failure = Some((market, err));
            }
        }
    }
    Vec::new()
}

fn market_failure(family: EndpointFamily, market: &Market, err: &AuditError) -> AuditResult {
    AuditResult::fail_with(true, format!("{family} failed for market={}: {err}", market.id), err)
}

/// Validators in suite order
pub fn suite() -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(InfoValidator),
        Box::new(MarketsValidator),
        Box::new(TradesValidator),
        Box::new(TradesByTimestampValidator),
        Box::new(OrdersSnapshotValidator),
        Box::new(CandlesValidator),
        Box::new(TickerValidator),
    ]
}

/// Run every enabled validator sequentially and collect their results
pub async fn run_suite(ctx: &mut AuditContext) -> Vec<AuditResult> {
    let mut results = Vec::new();
    for validator in suite() {
        let family = validator.family();
        if !capability::should_run(family, ctx.info()) {
            debug!(%family, "Skipping: capability not declared");
            continue;
        }
        info!(%family, "Auditing");
        results.extend(validator.validate(ctx).await);
    }
    results
}

/// Parse a property that already passed `timestamp_property`
pub(crate) fn timestamp_of(
    au: &Asserter<'_>,
    o: &Value,
    p: &str,
) -> Result<DateTime<Utc>, AssertionError> {
    o.get(p)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| au.fail(format!("Expected '{p}' to be a valid RFC3339 Timestamp: {}", to_json(o))))
}

/// Deserialize a record that already passed its field assertions
pub(crate) fn typed<T: serde::de::DeserializeOwned>(
    au: &Asserter<'_>,
    what: &str,
    o: &Value,
) -> Result<T, AssertionError> {
    serde_json::from_value(o.clone())
        .map_err(|e| au.fail(format!("Unexpected {what} shape ({e}): {}", to_json(o))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::Fetcher;
    use pretty_assertions::assert_eq;
    use services_common::{FetchError, HTTP_GONE, HttpConfig};

    /// Answers each market with a scripted status; `None` conforms
    struct Scripted(Vec<(&'static str, Option<u16>)>);

    #[async_trait]
    impl MarketAudit for Scripted {
        fn family(&self) -> EndpointFamily {
            EndpointFamily::Trades
        }

        async fn audit_market(
            &self,
            _ctx: &AuditContext,
            market: &Market,
        ) -> Result<MarketOutcome, AuditError> {
            let url = format!("http://localhost:3000/trades?market={}", market.id);
            match self.0.iter().find(|(id, _)| *id == market.id).and_then(|(_, s)| *s) {
                None => Ok(MarketOutcome::Conforms(format!("ok {}", market.id))),
                Some(HTTP_GONE) => Ok(MarketOutcome::NoHistory),
                Some(status) => Err(FetchError::with_status(url, status).into()),
            }
        }
    }

    fn ctx(ids: &[&str]) -> AuditContext {
        let fetcher = Fetcher::new("http://localhost:3000", &HttpConfig::default()).unwrap();
        let mut ctx = AuditContext::new(fetcher);
        ctx.set_markets(ids.iter().map(|id| Market::new(*id)).collect());
        ctx
    }

    #[tokio::test]
    async fn test_first_conforming_market_wins() {
        let v = Scripted(vec![("a", Some(500)), ("b", None), ("c", Some(500))]);
        let results = first_conforming_market(&v, &ctx(&["a", "b", "c"])).await;
        assert_eq!(results, vec![AuditResult::pass(true, "ok b")]);
    }

    #[tokio::test]
    async fn test_no_markets_yields_nothing() {
        let v = Scripted(Vec::new());
        assert_eq!(first_conforming_market(&v, &ctx(&[])).await, Vec::new());
    }

    #[tokio::test]
    async fn test_gone_everywhere_is_a_warning() {
        let v = Scripted(vec![("a", Some(410)), ("b", Some(410))]);
        let results = first_conforming_market(&v, &ctx(&["a", "b"])).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_warning());
        assert_eq!(
            results[0].message(),
            "/trades returned 410 Gone for market=b; no historical data to audit"
        );
    }

    #[tokio::test]
    async fn test_gone_last_market_surfaces_earlier_failure() {
        let v = Scripted(vec![("a", Some(500)), ("b", Some(502)), ("c", Some(410))]);
        let results = first_conforming_market(&v, &ctx(&["a", "b", "c"])).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_required_failure());
        assert_eq!(
            results[0].message(),
            "/trades failed for market=b: Request failed with status code 502"
        );
        assert_eq!(results[0].cause().and_then(|c| c.status), Some(502));
    }

    #[tokio::test]
    async fn test_failure_on_last_market_is_required() {
        let v = Scripted(vec![("a", Some(410)), ("b", Some(500))]);
        let results = first_conforming_market(&v, &ctx(&["a", "b"])).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_required_failure());
        assert!(results[0].message().starts_with("/trades failed for market=b"));
    }
}
