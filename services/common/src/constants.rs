//! Audit constants

/// Time unit constants
pub mod time {
    /// Milliseconds per minute
    pub const MINUTE_MS: i64 = 60 * 1000;

    /// Milliseconds per hour
    pub const HOUR_MS: i64 = 60 * MINUTE_MS;

    /// Milliseconds per day
    pub const DAY_MS: i64 = 24 * HOUR_MS;
}

/// Network and process lifecycle defaults
pub mod network {
    /// Port audited when a command is spawned and `PORT` is unset
    pub const DEFAULT_PORT: u16 = 3000;

    /// Host the spawned adapter is expected to listen on
    pub const DEFAULT_HOST: &str = "localhost";

    /// Readiness probe attempts before giving up
    pub const READINESS_MAX_ATTEMPTS: u32 = 4;

    /// First readiness backoff in milliseconds, doubled per attempt
    pub const READINESS_BASE_DELAY_MS: u64 = 1000;

    /// Per-attempt TCP connect timeout in milliseconds
    pub const READINESS_CONNECT_TIMEOUT_MS: u64 = 1000;

    /// Fetcher transport timeout in seconds
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Time allowed for the adapter to exit after being killed
    pub const SHUTDOWN_GRACE_PERIOD_MS: u64 = 5000;
}

/// Trade audit thresholds
pub mod trades {
    /// A first page must hold at least this many trades
    pub const MIN_TRADES_PER_PAGE: usize = 3;

    /// Trades stamped before this year are rejected as implausible
    pub const EARLIEST_TRADE_YEAR: i32 = 2006;
}

/// Metadata rules applied in strict mode
pub mod metadata {
    /// Minimum `/info` description length
    pub const MIN_STRICT_DESCRIPTION_LEN: usize = 1000;
}

/// Closed vocabularies accepted on the wire
pub mod vocab {
    /// Accepted market `type` values
    pub const MARKET_TYPES: &[&str] = &["spot", "derivative", "index"];

    /// Accepted `subtypes` for derivative markets
    pub const DERIVATIVE_SUBTYPES: &[&str] = &["future", "option", "perpetual"];

    /// Accepted trade `type` values
    pub const TRADE_TYPES: &[&str] = &[
        "market",
        "limit",
        "ask",
        "bid",
        "fill",
        "liquidation",
        "assignment",
    ];

    /// Accepted trade `side` values
    pub const TRADE_SIDES: &[&str] = &["buy", "sell"];

    /// Every property a trade record may carry
    pub const TRADE_KEYS: &[&str] = &[
        "id",
        "timestamp",
        "price",
        "amount",
        "amount_quote",
        "order",
        "type",
        "side",
        "raw",
    ];

    /// Candle interval codes
    pub const CANDLE_INTERVALS: &[&str] = &["1d", "1h", "1m"];

    /// Capability flags that expose market data
    pub const DATA_CAPABILITIES: &[&str] = &[
        "trades",
        "tradesByTimestamp",
        "orders",
        "ordersSnapshot",
        "ticker",
        "candles",
    ];

    /// Boolean capability flags
    pub const BOOLEAN_CAPABILITIES: &[&str] = &[
        "markets",
        "trades",
        "tradesByTimestamp",
        "tradesSocket",
        "orders",
        "ordersSnapshot",
        "ordersSocket",
        "ticker",
    ];
}
