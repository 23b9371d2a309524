//! Tracing subscriber setup

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter; `RUST_LOG` takes precedence
pub const DEFAULT_FILTER: &str = "exchange_auditor=info,adapter=info";

/// Filter used with `--verbose`
pub const VERBOSE_FILTER: &str = "exchange_auditor=debug,services_common=debug,adapter=debug";

/// Install the global subscriber. Logs go to stderr so the report on
/// stdout stays clean.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
