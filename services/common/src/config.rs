//! Audit configuration

use crate::constants::network::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS, READINESS_BASE_DELAY_MS,
    READINESS_CONNECT_TIMEOUT_MS, READINESS_MAX_ATTEMPTS, SHUTDOWN_GRACE_PERIOD_MS,
};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "audit.toml";

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "AUDIT";

/// Top-level audit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Port a spawned adapter listens on
    pub port: u16,
    /// Host a spawned adapter listens on
    pub host: String,
    /// Readiness probe policy
    pub readiness: ReadinessConfig,
    /// Fetcher transport settings
    pub http: HttpConfig,
    /// Subprocess teardown settings
    pub shutdown: ShutdownConfig,
    /// Apply strict `/info` metadata rules
    pub strict_metadata: bool,
}

/// Readiness probe policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Connect attempts before giving up
    pub max_attempts: u32,
    /// First backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Per-attempt connect timeout in milliseconds
    pub connect_timeout_ms: u64,
}

/// Fetcher transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

/// Subprocess teardown settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Bound on awaiting the adapter's exit after it was killed
    pub grace_period_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
            readiness: ReadinessConfig::default(),
            http: HttpConfig::default(),
            shutdown: ShutdownConfig::default(),
            strict_metadata: false,
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: READINESS_MAX_ATTEMPTS,
            base_delay_ms: READINESS_BASE_DELAY_MS,
            connect_timeout_ms: READINESS_CONNECT_TIMEOUT_MS,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: format!("nomics-platform-audit/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: SHUTDOWN_GRACE_PERIOD_MS,
        }
    }
}

impl ReadinessConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl AuditConfig {
    /// Load configuration from the optional file, `AUDIT_*` variables and `PORT`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(path, std::env::var("PORT").ok())
    }

    /// Layer defaults, file, environment and an explicit port override
    pub fn from_sources(path: Option<&Path>, port: Option<String>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("port", port)?
            .build()?;

        let config: Self = settings.try_deserialize()?;
        debug!(?config, "Loaded audit configuration");
        Ok(config)
    }

    /// Base URL a spawned adapter is audited at
    pub fn local_base_url(&self, path_prefix: &str) -> String {
        format!("http://{}:{}{}", self.host, self.port, path_prefix)
    }
}
