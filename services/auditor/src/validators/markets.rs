//! `/markets` listing checks

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::Value;
use services_common::constants::vocab::{DERIVATIVE_SUBTYPES, MARKET_TYPES};
use services_common::{AssertionError, AuditError, Market};
use tracing::error;

use super::Validator;
use crate::assertions::{AssertOpts, Asserter};
use crate::capability::EndpointFamily;
use crate::context::AuditContext;
use crate::fetcher::JsonResponse;
use crate::result::AuditResult;

/// Audits `/markets` and records the market list for later validators
pub struct MarketsValidator;

#[async_trait]
impl Validator for MarketsValidator {
    fn family(&self) -> EndpointFamily {
        EndpointFamily::Markets
    }

    async fn validate(&self, ctx: &mut AuditContext) -> Vec<AuditResult> {
        let response = match ctx.fetcher().get("/markets").await {
            Ok(response) => response,
            Err(e) => {
                error!(url = %e.url, "FAILED: {e}");
                return vec![AuditResult::fail_with(
                    true,
                    "/markets failed or not JSON",
                    &AuditError::from(e),
                )];
            }
        };

        let mut results = vec![AuditResult::pass(true, "/markets is valid JSON")];
        results.extend(check_markets(&response));
        ctx.set_markets(Market::list_from_value(&response.body));
        results
    }
}

/// Checks over a fetched `/markets` body
pub fn check_markets(response: &JsonResponse) -> Vec<AuditResult> {
    let au = Asserter::new(&response.url);
    let markets = match au.non_empty_array(&response.body, "market") {
        Ok(markets) => markets,
        Err(e) => return vec![AuditResult::fail_with(true, e.message.clone(), &AuditError::from(e))],
    };

    let checks: Vec<(bool, &str, Result<(), AssertionError>)> = vec![
        (
            true,
            "/markets entries all have ids",
            each(markets, |m| au.string_property(m, "id", AssertOpts::REQUIRED)),
        ),
        (
            true,
            "/markets entries have valid types",
            each(markets, |m| au.property_in_set(m, "type", MARKET_TYPES, AssertOpts::OPTIONAL)),
        ),
        (
            false,
            "/markets entries all have base currencies",
            each(markets, |m| au.string_property(m, "base", AssertOpts::REQUIRED)),
        ),
        (
            false,
            "/markets entries all have quote currencies",
            each(markets, |m| au.string_property(m, "quote", AssertOpts::REQUIRED)),
        ),
        (
            true,
            "/markets optional fields are well-formed",
            each(markets, |m| check_optional_fields(&au, m)),
        ),
    ];

    let mut results: Vec<AuditResult> = checks
        .into_iter()
        .map(|(required, pass, outcome)| {
            AuditResult::from_check(required, pass, outcome.map_err(AuditError::from))
        })
        .collect();
    results.extend(check_duplicate_ids(&au, markets));
    results
}

fn each(
    markets: &[Value],
    check: impl Fn(&Value) -> Result<bool, AssertionError>,
) -> Result<(), AssertionError> {
    markets.iter().try_for_each(|m| check(m).map(|_| ()))
}

fn check_optional_fields(au: &Asserter<'_>, m: &Value) -> Result<bool, AssertionError> {
    au.boolean_property(m, "active", AssertOpts::OPTIONAL)?;
    au.string_property(m, "settlement", AssertOpts::OPTIONAL)?;
    au.string_property(m, "underlying", AssertOpts::OPTIONAL)?;
    au.url_property(m, "market_url", AssertOpts::OPTIONAL)?;
    au.string_property(m, "description", AssertOpts::OPTIONAL)?;
    let subtypes: &[&str] = if m.get("type").and_then(Value::as_str) == Some("derivative") {
        DERIVATIVE_SUBTYPES
    } else {
        &[]
    };
    if au.array_property(m, "subtypes", AssertOpts::OPTIONAL)? {
        au.property_in_set(m, "subtypes", subtypes, AssertOpts::OPTIONAL)?;
    }
    Ok(true)
}

/// One failure per duplicated id, in first-seen order
fn check_duplicate_ids(au: &Asserter<'_>, markets: &[Value]) -> Vec<AuditResult> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    let mut order = Vec::new();
    for id in markets.iter().filter_map(|m| m.get("id").and_then(Value::as_str)) {
        let count = counts.entry(id).or_insert(0);
        if *count == 0 {
            order.push(id);
        }
        *count += 1;
    }

    let duplicates: Vec<AuditResult> = order
        .into_iter()
        .filter(|id| counts.get(id).is_some_and(|c| *c > 1))
        .map(|id| {
            let err = au.fail(format!("Duplicate market ID: {id}"));
            AuditResult::fail_with(true, err.message.clone(), &AuditError::from(err))
        })
        .collect();

    if duplicates.is_empty() {
        vec![AuditResult::pass(true, "/markets has no duplicate ids")]
    } else {
        duplicates
    }
}
