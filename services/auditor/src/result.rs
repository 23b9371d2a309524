//! Audit results and the overall verdict

use serde::Serialize;
use services_common::AuditError;

/// Kind of failure behind a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CauseKind {
    Fetch,
    Assertion,
    Process,
}

/// Underlying failure attached to a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cause {
    pub kind: CauseKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&AuditError> for Cause {
    fn from(err: &AuditError) -> Self {
        let (kind, status) = match err {
            AuditError::Fetch(e) => (CauseKind::Fetch, e.status),
            AuditError::Assertion(_) => (CauseKind::Assertion, None),
            AuditError::Process(_) => (CauseKind::Process, None),
        };
        Self {
            kind,
            message: err.to_string(),
            url: err.url().map(str::to_string),
            status,
        }
    }
}

/// Outcome of one conformance check. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditResult {
    passed: bool,
    required: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<Cause>,
}

impl AuditResult {
    pub fn pass(required: bool, message: impl Into<String>) -> Self {
        Self {
            passed: true,
            required,
            message: message.into(),
            cause: None,
        }
    }

    pub fn fail(required: bool, message: impl Into<String>) -> Self {
        Self {
            passed: false,
            required,
            message: message.into(),
            cause: None,
        }
    }

    /// Failing result carrying the error that caused it
    pub fn fail_with(required: bool, message: impl Into<String>, err: &AuditError) -> Self {
        Self {
            cause: Some(Cause::from(err)),
            ..Self::fail(required, message)
        }
    }

    /// Fold a check outcome into a result; the error's own tag decides
    /// whether a failure is required.
    pub fn from_check(
        required: bool,
        pass_message: impl Into<String>,
        outcome: Result<(), AuditError>,
    ) -> Self {
        match outcome {
            Ok(()) => Self::pass(required, pass_message),
            Err(err) => Self::fail_with(required && err.is_required(), err.to_string(), &err),
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// Failing and blocking
    pub fn is_required_failure(&self) -> bool {
        !self.passed && self.required
    }

    /// Failing but only a warning
    pub fn is_warning(&self) -> bool {
        !self.passed && !self.required
    }
}

/// Overall audit verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    PassWithWarnings,
    Fail,
}

impl Verdict {
    /// Reduce results to a verdict; order does not matter
    pub fn of(results: &[AuditResult]) -> Self {
        if results.iter().any(AuditResult::is_required_failure) {
            Self::Fail
        } else if results.iter().any(AuditResult::is_warning) {
            Self::PassWithWarnings
        } else {
            Self::Pass
        }
    }

    pub fn is_success(self) -> bool {
        !matches!(self, Self::Fail)
    }

    /// Process exit status for this verdict
    pub fn exit_code(self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }
}

/// Collected results of one audit run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    results: Vec<AuditResult>,
}

impl AuditReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: AuditResult) {
        self.results.push(result);
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = AuditResult>) {
        self.results.extend(results);
    }

    pub fn results(&self) -> &[AuditResult] {
        &self.results
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::of(&self.results)
    }

    pub fn required_failures(&self) -> impl Iterator<Item = &AuditResult> {
        self.results.iter().filter(|r| r.is_required_failure())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &AuditResult> {
        self.results.iter().filter(|r| r.is_warning())
    }
}
