//! Adapter subprocess lifecycle

use services_common::ProcessError;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::target::CommandSpec;

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// A spawned adapter whose output is streamed into the audit log
#[derive(Debug)]
pub struct AdapterProcess {
    child: Child,
    command: String,
}

impl AdapterProcess {
    /// Start `spec` with `PORT` set; stdout and stderr go to target `adapter`
    pub fn spawn(spec: &CommandSpec, port: u16) -> Result<Self, ProcessError> {
        let command = spec.to_string();
        let mut child = Command::new(&spec.executable)
            .args(&spec.args)
            .env("PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: command.clone(),
                source,
            })?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, Stream::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, Stream::Stderr));
        }
        info!(%command, pid = child.id(), "Started adapter");

        Ok(Self { child, command })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Exit status if the adapter has already exited
    pub fn exit_status(&mut self) -> Option<ExitStatus> {
        match self.child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                warn!(command = %self.command, "Failed to poll adapter status: {e}");
                None
            }
        }
    }

    /// Error describing an early exit, if the adapter is gone
    pub fn early_exit(&mut self) -> Option<ProcessError> {
        self.exit_status().map(|status| ProcessError::ExitedEarly {
            command: self.command.clone(),
            status: status.to_string(),
        })
    }

    /// Kill the adapter and wait up to `grace` for it to exit
    pub async fn terminate(mut self, grace: Duration) -> Result<ExitStatus, ProcessError> {
        if let Some(status) = self.exit_status() {
            debug!(command = %self.command, %status, "Adapter already exited");
            return Ok(status);
        }

        self.child
            .start_kill()
            .map_err(|source| ProcessError::Terminate {
                command: self.command.clone(),
                source,
            })?;

        match timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!(command = %self.command, %status, "Adapter stopped");
                Ok(status)
            }
            Ok(Err(source)) => Err(ProcessError::Terminate {
                command: self.command.clone(),
                source,
            }),
            Err(_) => Err(ProcessError::TerminateTimeout {
                command: self.command.clone(),
                waited_ms: u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

async fn forward_lines<R>(reader: R, stream: Stream)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match stream {
                Stream::Stdout => info!(target: "adapter", "{line}"),
                Stream::Stderr => warn!(target: "adapter", "{line}"),
            },
            Ok(None) => break,
            Err(e) => {
                debug!(target: "adapter", ?stream, "Output stream closed: {e}");
                break;
            }
        }
    }
}
