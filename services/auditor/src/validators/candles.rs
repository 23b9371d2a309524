//! `/candles` series checks

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use services_common::{AssertionError, AuditError, Candle, CandleInterval, Market};
use tracing::{debug, warn};

use super::{Validator, timestamp_of, typed};
use crate::assertions::{AssertOpts, Asserter};
use crate::capability::EndpointFamily;
use crate::context::AuditContext;
use crate::result::AuditResult;

/// Timestamps are valid, strictly ascending, numerous enough, fresh and
/// aligned to the interval.
pub fn check_candle_series(
    au: &Asserter<'_>,
    interval: CandleInterval,
    timestamps: &[DateTime<Utc>],
    now: DateTime<Utc>,
) -> Result<(), AssertionError> {
    let mut sorted = timestamps.to_vec();
    sorted.sort();
    au.ensure_with(sorted == timestamps, || {
        format!("Expected {interval} candles to be sorted by timestamp ascending")
    })?;
    au.ensure_with(timestamps.windows(2).all(|w| w[0] < w[1]), || {
        format!("Expected {interval} candle timestamps to be unique")
    })?;

    au.ensure_with(timestamps.len() >= interval.min_points(), || {
        format!("Expected at least {} {interval} candles", interval.min_points())
    })?;
    let fresh = timestamps
        .last()
        .is_some_and(|last| *last > now - interval.freshness_window());
    au.ensure_with(fresh, || {
        format!(
            "Expected last {interval} candle to be within the last {}",
            interval.freshness_label()
        )
    })?;

    if let Some(ts) = timestamps.iter().find(|ts| !interval.is_aligned(ts)) {
        return Err(au.fail(format!(
            "Expected timestamp {} to be aligned to {} candle size in UTC",
            ts.to_rfc3339_opts(SecondsFormat::Millis, true),
            interval.unit_label()
        )));
    }
    Ok(())
}

/// OHLC ordering and volume checks for one candle record
pub fn check_candle_prices(au: &Asserter<'_>, c: &Value) -> Result<Candle, AssertionError> {
    for p in ["open", "high", "low", "close"] {
        au.numeric_string_property(c, p, AssertOpts::REQUIRED)?;
    }
    let volume = au.numeric_string_either(c, "volume", "volume_quote")?;
    let candle: Candle = typed(au, "candle", c)?;
    let Some(ohlc) = candle.ohlc() else {
        return Err(au.fail("Expected open, high, low and close to be numeric strings"));
    };

    au.ensure(ohlc.high >= ohlc.open, "Expected high to be greater than or equal to open")?;
    au.ensure(ohlc.high >= ohlc.close, "Expected high to be greater than or equal to close")?;
    au.ensure(ohlc.high >= ohlc.low, "Expected high to be greater than or equal to low")?;
    au.ensure(ohlc.low > 0.0, "Expected low to be greater than 0")?;
    au.ensure(ohlc.low <= ohlc.open, "Expected low to be less than or equal to open")?;
    au.ensure(ohlc.low <= ohlc.close, "Expected low to be less than or equal to close")?;
    au.ensure(volume >= 0.0, "Expected volume to be greater than or equal to 0")?;
    Ok(candle)
}

/// Full check of one fetched series
pub fn check_candles(
    au: &Asserter<'_>,
    interval: CandleInterval,
    body: &Value,
    now: DateTime<Utc>,
) -> Result<Vec<Candle>, AssertionError> {
    let items = au.array(body, "candles")?;
    let timestamps = items
        .iter()
        .map(|c| {
            au.timestamp_property(c, "timestamp", AssertOpts::REQUIRED)?;
            timestamp_of(au, c, "timestamp")
        })
        .collect::<Result<Vec<_>, _>>()?;
    check_candle_series(au, interval, &timestamps, now)?;
    items.iter().map(|c| check_candle_prices(au, c)).collect()
}

/// Audits `/candles` on the first market, once per declared interval
pub struct CandlesValidator;

impl CandlesValidator {
    async fn audit_interval(
        &self,
        ctx: &AuditContext,
        market: &Market,
        interval: CandleInterval,
    ) -> Result<String, AuditError> {
        let response = ctx
            .fetcher()
            .get_with_query(
                "/candles",
                &[("market", market.id.as_str()), ("interval", interval.code())],
            )
            .await?;
        let au = Asserter::new(&response.url);
        let candles = check_candles(&au, interval, &response.body, Utc::now())?;
        debug!(%interval, count = candles.len(), "Candle series conforms");
        Ok(format!(
            "/candles serves a fresh, aligned {interval} series for market={}",
            market.id
        ))
    }
}

#[async_trait]
impl Validator for CandlesValidator {
    fn family(&self) -> EndpointFamily {
        EndpointFamily::Candles
    }

    async fn validate(&self, ctx: &mut AuditContext) -> Vec<AuditResult> {
        let Some(market) = ctx.markets().first() else {
            debug!("No markets to audit candles on");
            return Vec::new();
        };

        let mut results = Vec::new();
        for interval in ctx.capability().candles.intervals() {
            let result = match self.audit_interval(ctx, market, interval).await {
                Ok(message) => AuditResult::pass(true, message),
                Err(err) => {
                    warn!(%interval, market = %market.id, url = err.url().unwrap_or("-"), "FAILED: {err}");
                    AuditResult::fail_with(
                        true,
                        format!("/candles failed for market={} interval={interval}: {err}", market.id),
                        &err,
                    )
                }
            };
            results.push(result);
        }
        results
    }
}
