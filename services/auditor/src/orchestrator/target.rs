//! What to audit: a running URL or a command to start

use reqwest::Url;
use services_common::ProcessError;
use std::fmt;

/// Executable plus arguments, split by the CLI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub executable: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Split a command line on whitespace; no shell quoting is applied
    pub fn parse(command: &str) -> Result<Self, ProcessError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let executable = parts.next().ok_or(ProcessError::EmptyCommand)?;
        Ok(Self {
            executable,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.executable)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Audit target resolved from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditTarget {
    /// Adapter already running at this base URL
    Url(Url),
    /// Adapter to start locally; audited at `http://<host>:<port><path_prefix>`
    Command {
        spec: CommandSpec,
        path_prefix: String,
    },
}

impl AuditTarget {
    /// An `http(s)` URL is audited directly; anything else is a command
    pub fn parse(endpoint: &str, path_prefix: Option<&str>) -> Result<Self, ProcessError> {
        match Url::parse(endpoint.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Url(url)),
            _ => Ok(Self::Command {
                spec: CommandSpec::parse(endpoint)?,
                path_prefix: normalize_prefix(path_prefix.unwrap_or_default()),
            }),
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
