//! Exchange adapter conformance auditor
//!
//! Audits an exchange data adapter's HTTP surface: fetches each declared
//! endpoint family, checks records against the conformance rules, and
//! reduces the collected results to a pass/fail verdict. An adapter can be
//! audited at a URL or started locally as a subprocess.

pub mod assertions;
pub mod capability;
pub mod context;
pub mod fetcher;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod result;
pub mod validators;

pub use capability::{EndpointFamily, plan, should_run};
pub use context::AuditContext;
pub use fetcher::{Fetcher, JsonResponse};
pub use orchestrator::{AuditState, AuditTarget, CommandSpec, Orchestrator};
pub use result::{AuditReport, AuditResult, Cause, CauseKind, Verdict};
pub use validators::run_suite;
