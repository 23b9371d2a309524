//! `/info` identity and capability checks

use async_trait::async_trait;
use serde_json::Value;
use services_common::constants::metadata::MIN_STRICT_DESCRIPTION_LEN;
use services_common::constants::vocab::{BOOLEAN_CAPABILITIES, CANDLE_INTERVALS};
use services_common::{AssertionError, AuditError, Capability, Info};
use tracing::error;

use super::Validator;
use crate::assertions::{AssertOpts, Asserter, to_json};
use crate::capability::EndpointFamily;
use crate::context::AuditContext;
use crate::fetcher::JsonResponse;
use crate::result::AuditResult;

/// Audits `/info` and records the capability snapshot
pub struct InfoValidator;

#[async_trait]
impl Validator for InfoValidator {
    fn family(&self) -> EndpointFamily {
        EndpointFamily::Info
    }

    async fn validate(&self, ctx: &mut AuditContext) -> Vec<AuditResult> {
        let response = match ctx.fetcher().get("/info").await {
            Ok(response) => response,
            Err(e) => {
                error!(url = %e.url, "FAILED: {e}");
                return vec![AuditResult::fail_with(
                    true,
                    "/info failed or not JSON",
                    &AuditError::from(e),
                )];
            }
        };

        let mut results = vec![AuditResult::pass(true, "/info is valid JSON")];
        results.extend(check_info(&response, ctx.strict_metadata()));
        ctx.set_info(Info::from_value(&response.body));
        results
    }
}

/// Field and capability checks over a fetched `/info` body
pub fn check_info(response: &JsonResponse, strict: bool) -> Vec<AuditResult> {
    let au = Asserter::new(&response.url);
    let info = &response.body;
    let optional = AssertOpts::required(strict);

    let mut checks: Vec<(bool, &str, Result<(), AssertionError>)> = vec![
        (
            true,
            "/info has a name",
            au.string_property(info, "name", AssertOpts::REQUIRED).map(|_| ()),
        ),
        (
            strict,
            "/info has a description",
            check_description(&au, info, strict),
        ),
        (
            strict,
            "/info has a logo URL",
            au.url_property(info, "logo", if strict { optional.with_https() } else { optional })
                .map(|_| ()),
        ),
        (
            false,
            "/info has a website URL",
            au.url_property(info, "website", AssertOpts::OPTIONAL).map(|_| ()),
        ),
        (
            false,
            "/info has a twitter handle",
            au.string_property(info, "twitter", AssertOpts::OPTIONAL).map(|_| ()),
        ),
        (
            strict,
            "/info has a location",
            au.string_property(info, "location", optional).map(|_| ()),
        ),
        (
            false,
            "/info has a version",
            au.string_property(info, "version", AssertOpts::OPTIONAL).map(|_| ()),
        ),
    ];

    if info.get("capability").is_some() {
        checks.push((
            true,
            "/info capability flags are well-formed",
            check_capability_shape(&au, info),
        ));
        let capability = info
            .get("capability")
            .filter(|c| c.is_object())
            .map(Capability::from_value)
            .unwrap_or_default();
        checks.push((
            true,
            "/info declares at least one data capability",
            au.ensure(
                capability.has_data_capability(),
                "Expected at least one of trades, tradesByTimestamp, orders, ordersSnapshot, ticker or candles to be enabled",
            ),
        ));
        let orphaned = capability.orphaned_market_families();
        checks.push((
            false,
            "/info capabilities are consistent",
            au.ensure_with(orphaned.is_empty(), || {
                format!(
                    "Capabilities {} require 'markets' and will not be audited",
                    orphaned.join(", ")
                )
            }),
        ));
    }

    checks
        .into_iter()
        .map(|(required, pass, outcome)| {
            AuditResult::from_check(required, pass, outcome.map_err(AuditError::from))
        })
        .collect()
}

fn check_description(au: &Asserter<'_>, info: &Value, strict: bool) -> Result<(), AssertionError> {
    if !au.string_property(info, "description", AssertOpts::required(strict))? || !strict {
        return Ok(());
    }
    let len = info
        .get("description")
        .and_then(Value::as_str)
        .map_or(0, |d| d.chars().count());
    au.ensure_with(len >= MIN_STRICT_DESCRIPTION_LEN, || {
        format!("Expected 'description' to be at least {MIN_STRICT_DESCRIPTION_LEN} characters, got {len}")
    })
}

fn check_capability_shape(au: &Asserter<'_>, info: &Value) -> Result<(), AssertionError> {
    let capability = &info["capability"];
    au.ensure_with(capability.is_object(), || {
        format!("Expected 'capability' to be an object: {}", to_json(info))
    })?;
    for flag in BOOLEAN_CAPABILITIES {
        au.boolean_property(capability, flag, AssertOpts::OPTIONAL)?;
    }
    match capability.get("candles") {
        None | Some(Value::Bool(_)) => Ok(()),
        Some(Value::Array(_)) => au
            .property_in_set(capability, "candles", CANDLE_INTERVALS, AssertOpts::REQUIRED)
            .map(|_| ()),
        Some(_) => Err(au.fail(format!(
            "Expected 'candles' to be a boolean or a list of intervals: {}",
            to_json(capability)
        ))),
    }
}
