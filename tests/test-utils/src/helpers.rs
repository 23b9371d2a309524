//! Test helper functions

use anyhow::Result;
use std::net::{SocketAddr, TcpListener};
use std::sync::Once;
use std::time::Duration;
use tokio::io::copy_bidirectional;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize test logging once per test binary.
///
/// Honors `RUST_LOG`; output goes through the test writer so it only shows
/// for failing tests.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "exchange_auditor=debug,adapter=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// Wrap a future with a timeout so a hung audit fails the test instead of
/// blocking it.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl std::future::Future<Output = T>,
) -> Result<T> {
    timeout(duration, future)
        .await
        .map_err(|_| anyhow::anyhow!("Test timeout after {:?}", duration))
}

/// A local port nothing is listening on
pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|addr| addr.port())
        .unwrap_or(0)
}

/// Forward every connection accepted on `listener` to `upstream` until the
/// listener fails. Lets a test decide the moment a port starts answering.
pub async fn relay(listener: tokio::net::TcpListener, upstream: SocketAddr) {
    loop {
        let Ok((mut inbound, _)) = listener.accept().await else {
            return;
        };
        tokio::spawn(async move {
            if let Ok(mut outbound) = TcpStream::connect(upstream).await {
                let _ = copy_bidirectional(&mut inbound, &mut outbound).await;
            }
        });
    }
}
