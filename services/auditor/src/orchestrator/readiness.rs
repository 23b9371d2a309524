//! TCP readiness probe with bounded exponential backoff

use services_common::{ProcessError, ReadinessConfig};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

/// Bounded retry schedule: `max_attempts` connects, doubling the wait after
/// each failure starting at `base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl BackoffPolicy {
    pub fn from_config(config: &ReadinessConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.base_delay(),
        }
    }

    /// Wait after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Every wait the policy may spend between attempts
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts).map(|a| self.delay_after(a)).collect()
    }
}

/// Where and how to probe
#[derive(Debug, Clone)]
pub struct Probe<'a> {
    pub host: &'a str,
    pub port: u16,
    pub connect_timeout: Duration,
}

impl Probe<'_> {
    /// One raw TCP connect attempt
    pub async fn attempt(&self) -> bool {
        matches!(
            timeout(self.connect_timeout, TcpStream::connect((self.host, self.port))).await,
            Ok(Ok(_))
        )
    }
}

/// Poll until something accepts connections, the policy is exhausted, or
/// `early_exit` reports that the adapter is gone.
pub async fn wait_until_ready<F>(
    probe: &Probe<'_>,
    policy: &BackoffPolicy,
    mut early_exit: F,
) -> Result<(), ProcessError>
where
    F: FnMut() -> Option<ProcessError>,
{
    let mut attempt = 0;
    while attempt < policy.max_attempts {
        attempt += 1;
        if let Some(err) = early_exit() {
            return Err(err);
        }
        if probe.attempt().await {
            info!(port = probe.port, attempt, "Adapter is accepting connections");
            return Ok(());
        }
        if attempt < policy.max_attempts {
            let delay = policy.delay_after(attempt);
            debug!(
                port = probe.port,
                "Readiness attempt {}/{} failed, retrying in {:?}",
                attempt,
                policy.max_attempts,
                delay
            );
            sleep(delay).await;
        }
    }

    Err(ProcessError::NotReachable {
        port: probe.port,
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Instant;
    use tokio::net::TcpListener;

    fn policy(max_attempts: u32, base_ms: u64) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts,
            base_delay: Duration::from_millis(base_ms),
        }
    }

    async fn unused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_delays_double() {
        let p = policy(4, 1000);
        assert_eq!(
            p.schedule(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
        assert_eq!(policy(1, 1000).schedule(), Vec::<Duration>::new());
    }

    #[test]
    fn test_default_policy() {
        let p = BackoffPolicy::from_config(&ReadinessConfig::default());
        assert_eq!(p, policy(4, 1000));
    }

    #[tokio::test]
    async fn test_ready_listener_succeeds_first_attempt() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let probe = Probe {
            host: "127.0.0.1",
            port: listener.local_addr().unwrap().port(),
            connect_timeout: Duration::from_millis(500),
        };
        let mut calls = 0;
        let result = wait_until_ready(&probe, &policy(4, 10), || {
            calls += 1;
            None
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_exhaustion_is_bounded() {
        let probe = Probe {
            host: "127.0.0.1",
            port: unused_port().await,
            connect_timeout: Duration::from_millis(200),
        };
        let started = Instant::now();
        let err = wait_until_ready(&probe, &policy(3, 10), || None).await.unwrap_err();
        assert!(matches!(err, ProcessError::NotReachable { attempts: 3, .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_early_exit_stops_polling() {
        let probe = Probe {
            host: "127.0.0.1",
            port: unused_port().await,
            connect_timeout: Duration::from_millis(200),
        };
        let err = wait_until_ready(&probe, &policy(4, 1000), || {
            Some(ProcessError::ExitedEarly {
                command: "adapter".to_string(),
                status: "exit status: 1".to_string(),
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ProcessError::ExitedEarly { .. }));
    }
}
