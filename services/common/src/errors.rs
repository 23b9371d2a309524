//! Common error types for the audit engine

use thiserror::Error;

/// HTTP status an adapter returns for a market that intentionally has no history
pub const HTTP_GONE: u16 = 410;

/// Transport, status, content-type or JSON parse failure for one GET
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchError {
    /// Fully qualified URL that was requested
    pub url: String,
    /// Human readable failure description
    pub message: String,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
}

impl FetchError {
    /// Create a fetch error without an HTTP status
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a fetch error for a non-2xx response
    pub fn with_status(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            message: format!("Request failed with status code {status}"),
            status: Some(status),
        }
    }

    /// Whether the adapter answered `410 Gone`
    pub fn is_gone(&self) -> bool {
        self.status == Some(HTTP_GONE)
    }
}

/// Conformance rule violation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionError {
    /// URL the offending data came from
    pub url: Option<String>,
    /// Violation description, usually embedding the offending JSON
    pub message: String,
    /// Whether the violated rule blocks a passing verdict
    pub required: bool,
}

impl AssertionError {
    /// Create a required assertion failure
    pub fn new(url: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            url: url.map(str::to_string),
            message: message.into(),
            required: true,
        }
    }

    /// Re-tag the failure as optional (warning only)
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Adapter subprocess lifecycle failures
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The command line had no executable
    #[error("Command is required")]
    EmptyCommand,

    /// The executable could not be started
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The adapter exited before it became reachable
    #[error("`{command}` exited before accepting connections ({status})")]
    ExitedEarly { command: String, status: String },

    /// Readiness probe exhausted its attempts
    #[error("Nothing accepted connections on port {port} after {attempts} attempts")]
    NotReachable { port: u16, attempts: u32 },

    /// Termination request could not be delivered
    #[error("Failed to stop `{command}`: {source}")]
    Terminate {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The adapter did not exit within the grace period
    #[error("`{command}` did not exit within {waited_ms}ms")]
    TerminateTimeout { command: String, waited_ms: u64 },
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Source could not be read or deserialized
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),
}

/// Any failure raised while auditing
#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Assertion(#[from] AssertionError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl AuditError {
    /// URL the failure is attributed to, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Fetch(e) => Some(e.url.as_str()),
            Self::Assertion(e) => e.url.as_deref(),
            Self::Process(_) => None,
        }
    }

    /// Whether the failure blocks a passing verdict
    pub fn is_required(&self) -> bool {
        match self {
            Self::Assertion(e) => e.required,
            Self::Fetch(_) | Self::Process(_) => true,
        }
    }
}
