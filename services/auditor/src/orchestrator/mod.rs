//! Audit run lifecycle: start, poll, audit, terminate

pub mod process;
pub mod readiness;
pub mod target;

use serde::Serialize;
use services_common::{AuditConfig, AuditError, ProcessError};
use tracing::{debug, error, info, warn};

use crate::context::AuditContext;
use crate::fetcher::Fetcher;
use crate::result::{AuditReport, AuditResult};
use crate::validators::run_suite;

pub use process::AdapterProcess;
pub use readiness::{BackoffPolicy, Probe, wait_until_ready};
pub use target::{AuditTarget, CommandSpec};

/// Lifecycle state of one audit run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditState {
    Idle,
    Starting,
    Polling,
    Auditing,
    Terminating,
    Done,
}

/// Drives one audit run and owns its results
#[derive(Debug)]
pub struct Orchestrator {
    config: AuditConfig,
    state: AuditState,
}

impl Orchestrator {
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config,
            state: AuditState::Idle,
        }
    }

    pub fn state(&self) -> AuditState {
        self.state
    }

    fn transition(&mut self, next: AuditState) {
        debug!(from = ?self.state, to = ?next, "Audit state transition");
        self.state = next;
    }

    /// Audit `target`. A spawned adapter is always terminated before this
    /// returns, whatever happened before.
    pub async fn run(&mut self, target: AuditTarget) -> AuditReport {
        let report = match target {
            AuditTarget::Url(url) => self.audit(url.as_str()).await,
            AuditTarget::Command { spec, path_prefix } => {
                self.run_command(&spec, &path_prefix).await
            }
        };
        self.transition(AuditState::Done);
        report
    }

    async fn run_command(&mut self, spec: &CommandSpec, path_prefix: &str) -> AuditReport {
        self.transition(AuditState::Starting);
        let mut adapter = match AdapterProcess::spawn(spec, self.config.port) {
            Ok(adapter) => adapter,
            Err(e) => {
                error!(command = %spec, "FAILED: {e}");
                self.transition(AuditState::Terminating);
                return process_failure("Adapter failed to start", e);
            }
        };

        self.transition(AuditState::Polling);
        let probe = Probe {
            host: &self.config.host,
            port: self.config.port,
            connect_timeout: self.config.readiness.connect_timeout(),
        };
        let policy = BackoffPolicy::from_config(&self.config.readiness);
        let ready = wait_until_ready(&probe, &policy, || adapter.early_exit()).await;

        let mut report = match ready {
            Ok(()) => {
                let base_url = self.config.local_base_url(path_prefix);
                self.audit(&base_url).await
            }
            Err(e) => {
                error!(command = %spec, "FAILED: {e}");
                process_failure("Adapter never became reachable", e)
            }
        };

        self.transition(AuditState::Terminating);
        if let Err(e) = adapter.terminate(self.config.shutdown.grace_period()).await {
            warn!(command = %spec, "Adapter shutdown: {e}");
            report.push(AuditResult::fail_with(
                false,
                "Adapter did not shut down cleanly",
                &AuditError::from(e),
            ));
        }
        report
    }

    async fn audit(&mut self, base_url: &str) -> AuditReport {
        self.transition(AuditState::Auditing);
        info!(%base_url, "Auditing adapter");

        let mut report = AuditReport::new();
        let fetcher = match Fetcher::new(base_url, &self.config.http) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                report.push(AuditResult::fail_with(
                    true,
                    "Could not build HTTP client",
                    &AuditError::from(e),
                ));
                return report;
            }
        };
        let mut ctx = AuditContext::new(fetcher).with_strict_metadata(self.config.strict_metadata);
        report.extend(run_suite(&mut ctx).await);
        report
    }
}

fn process_failure(message: &str, err: ProcessError) -> AuditReport {
    let mut report = AuditReport::new();
    report.push(AuditResult::fail_with(true, message, &AuditError::from(err)));
    report
}
