//! `/trades` and `/trades-by-timestamp` pagination checks

use async_trait::async_trait;
use serde_json::Value;
use services_common::constants::trades::{EARLIEST_TRADE_YEAR, MIN_TRADES_PER_PAGE};
use services_common::constants::vocab::{TRADE_KEYS, TRADE_SIDES, TRADE_TYPES};
use services_common::{AssertionError, AuditError, FetchError, Market, Trade};

use super::{MarketAudit, MarketOutcome, Validator, first_conforming_market, typed};
use crate::assertions::{AssertOpts, Asserter};
use crate::capability::EndpointFamily;
use crate::context::AuditContext;
use crate::fetcher::JsonResponse;
use crate::result::AuditResult;

/// Validate every record of a trades page and return the typed trades
pub fn check_trade_records(au: &Asserter<'_>, items: &[Value]) -> Result<Vec<Trade>, AssertionError> {
    items
        .iter()
        .map(|t| {
            au.string_property(t, "id", AssertOpts::REQUIRED)?;
            au.timestamp_property(t, "timestamp", AssertOpts::REQUIRED)?;
            au.numeric_string_property(t, "price", AssertOpts::REQUIRED)?;
            au.numeric_string_either(t, "amount", "amount_quote")?;
            au.string_property(t, "order", AssertOpts::OPTIONAL)?;
            au.property_in_set(t, "type", TRADE_TYPES, AssertOpts::OPTIONAL)?;
            au.property_in_set(t, "side", TRADE_SIDES, AssertOpts::OPTIONAL)?;
            au.known_properties(t, TRADE_KEYS, "Trade")?;
            typed::<Trade>(au, "trade", t)
        })
        .collect()
}

/// First page must hold enough well-formed trades, none before the epoch bound
pub fn check_first_page(
    au: &Asserter<'_>,
    market_id: &str,
    body: &Value,
) -> Result<Vec<Trade>, AssertionError> {
    let items = au.array(body, "trades")?;
    au.ensure_with(items.len() >= MIN_TRADES_PER_PAGE, || {
        format!(
            "Expected at least {MIN_TRADES_PER_PAGE} trades for market={market_id}, got {}",
            items.len()
        )
    })?;
    let trades = check_trade_records(au, items)?;
    au.ensure_with(!trades.iter().any(Trade::is_before_epoch_bound), || {
        format!(
            "Trades for market={market_id} contained a trade with a timestamp before {EARLIEST_TRADE_YEAR}."
        )
    })?;
    Ok(trades)
}

/// Second id-cursor page resumes strictly after `since` and overlaps the first page
pub fn check_id_continuation(
    au: &Asserter<'_>,
    first: &[Trade],
    second: &[Trade],
) -> Result<(), AssertionError> {
    let (Some(since), Some(next)) = (first.first(), first.get(1)) else {
        return Err(au.fail("Expected at least two trades on the first page"));
    };
    let (since, next) = (&since.id, &next.id);
    au.ensure_with(!second.is_empty(), || {
        format!("Trades with since={since} didn't return any trades")
    })?;
    au.ensure_with(!second.iter().any(|t| &t.id == since), || {
        format!(
            "Trades with since={since} contained a trade with the same id as the since parameter. \
             Only trades *after* the since id should be returned"
        )
    })?;
    au.ensure_with(second.iter().any(|t| &t.id == next), || {
        format!(
            "Trades with since={since} didn't contain an overlap with the first page. \
             Expected to see trade with id {next}"
        )
    })
}

/// Second time-cursor page resumes after the `cursor` trade and overlaps the
/// first page.
///
/// The cursor trade itself must not come back and nothing may predate it.
/// Other trades stamped exactly at the cursor's timestamp are accepted since
/// a timestamp cursor cannot tell them apart from later ones.
pub fn check_timestamp_continuation(
    au: &Asserter<'_>,
    since_raw: &str,
    cursor: &Trade,
    first: &[Trade],
    second: &[Trade],
) -> Result<(), AssertionError> {
    let since = cursor.timestamp;
    au.ensure_with(!second.is_empty(), || {
        format!("Trades with since={since_raw} didn't return any trades")
    })?;
    au.ensure_with(!second.iter().any(|t| t.id == cursor.id), || {
        format!(
            "Trades with since={since_raw} contained trade {}, the trade the since parameter was taken from. \
             Only trades *after* the since trade should be returned",
            cursor.id
        )
    })?;
    if let Some(early) = second.iter().find(|t| t.timestamp < since) {
        return Err(au.fail(format!(
            "Trades with since={since_raw} contained trade {} with a timestamp before the since parameter",
            early.id
        )));
    }
    let Some(expected) = first.iter().find(|t| t.timestamp > since) else {
        return Err(au.fail(format!(
            "Expected the first page to contain a trade after since={since_raw}"
        )));
    };
    au.ensure_with(second.iter().any(|t| t.id == expected.id), || {
        format!(
            "Trades with since={since_raw} didn't contain an overlap with the first page. \
             Expected to see trade with id {}",
            expected.id
        )
    })
}

/// Fetch the first page of a trades endpoint; `None` means 410 Gone
async fn first_page(
    ctx: &AuditContext,
    path: &str,
    market: &Market,
) -> Result<Option<JsonResponse>, FetchError> {
    match ctx
        .fetcher()
        .get_with_query(path, &[("market", market.id.as_str())])
        .await
    {
        Ok(response) => Ok(Some(response)),
        Err(e) if e.is_gone() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Audits id-cursor pagination on `/trades`
pub struct TradesValidator;

#[async_trait]
impl MarketAudit for TradesValidator {
    fn family(&self) -> EndpointFamily {
        EndpointFamily::Trades
    }

    async fn audit_market(
        &self,
        ctx: &AuditContext,
        market: &Market,
    ) -> Result<MarketOutcome, AuditError> {
        let Some(page1) = first_page(ctx, "/trades", market).await? else {
            return Ok(MarketOutcome::NoHistory);
        };
        let au = Asserter::new(&page1.url);
        let first = check_first_page(&au, &market.id, &page1.body)?;

        let since = first[0].id.as_str();
        let page2 = ctx
            .fetcher()
            .get_with_query("/trades", &[("market", market.id.as_str()), ("since", since)])
            .await?;
        let au = Asserter::new(&page2.url);
        let items = au.array(&page2.body, "trades")?;
        let second = check_trade_records(&au, items)?;
        check_id_continuation(&au, &first, &second)?;

        Ok(MarketOutcome::Conforms(format!(
            "/trades paginates by id for market={}",
            market.id
        )))
    }
}

#[async_trait]
impl Validator for TradesValidator {
    fn family(&self) -> EndpointFamily {
        EndpointFamily::Trades
    }

    async fn validate(&self, ctx: &mut AuditContext) -> Vec<AuditResult> {
        first_conforming_market(self, ctx).await
    }
}

/// Audits timestamp-cursor pagination on `/trades-by-timestamp`
pub struct TradesByTimestampValidator;

#[async_trait]
impl MarketAudit for TradesByTimestampValidator {
    fn family(&self) -> EndpointFamily {
        EndpointFamily::TradesByTimestamp
    }

    async fn audit_market(
        &self,
        ctx: &AuditContext,
        market: &Market,
    ) -> Result<MarketOutcome, AuditError> {
        let path = EndpointFamily::TradesByTimestamp.path();
        let Some(page1) = first_page(ctx, path, market).await? else {
            return Ok(MarketOutcome::NoHistory);
        };
        let au = Asserter::new(&page1.url);
        let first = check_first_page(&au, &market.id, &page1.body)?;

        // Cursor is the oldest trade, its timestamp sent back exactly as served
        let Some((oldest, cursor)) = first.iter().enumerate().min_by_key(|(_, t)| t.timestamp)
        else {
            return Err(au.fail("Expected at least one trade").into());
        };
        let since_raw = page1.body[oldest]["timestamp"].as_str().unwrap_or_default().to_string();

        let page2 = ctx
            .fetcher()
            .get_with_query(path, &[("market", market.id.as_str()), ("since", &since_raw)])
            .await?;
        let au = Asserter::new(&page2.url);
        let items = au.array(&page2.body, "trades")?;
        let second = check_trade_records(&au, items)?;
        check_timestamp_continuation(&au, &since_raw, cursor, &first, &second)?;

        Ok(MarketOutcome::Conforms(format!(
            "/trades-by-timestamp paginates by timestamp for market={}",
            market.id
        )))
    }
}

#[async_trait]
impl Validator for TradesByTimestampValidator {
    fn family(&self) -> EndpointFamily {
        EndpointFamily::TradesByTimestamp
    }

    async fn validate(&self, ctx: &mut AuditContext) -> Vec<AuditResult> {
        first_conforming_market(self, ctx).await
    }
}
