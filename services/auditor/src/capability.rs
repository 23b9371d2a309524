//! Capability gate: decides which endpoint families get audited

use serde::Serialize;
use services_common::{Capability, Info};
use std::fmt;

/// Endpoint family audited by one validator, in suite order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EndpointFamily {
    Info,
    Markets,
    Trades,
    TradesByTimestamp,
    OrdersSnapshot,
    Candles,
    Ticker,
}

impl EndpointFamily {
    /// Fixed audit order; later families depend on earlier ones
    pub const SUITE: [Self; 7] = [
        Self::Info,
        Self::Markets,
        Self::Trades,
        Self::TradesByTimestamp,
        Self::OrdersSnapshot,
        Self::Candles,
        Self::Ticker,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Info => "/info",
            Self::Markets => "/markets",
            Self::Trades => "/trades",
            Self::TradesByTimestamp => "/trades-by-timestamp",
            Self::OrdersSnapshot => "/orders/snapshot",
            Self::Candles => "/candles",
            Self::Ticker => "/ticker",
        }
    }

    /// Whether the family audits individual markets
    pub fn is_market_scoped(self) -> bool {
        !matches!(self, Self::Info | Self::Markets)
    }

    fn declared(self, cap: &Capability) -> bool {
        match self {
            Self::Info => true,
            Self::Markets => cap.markets,
            Self::Trades => cap.trades,
            Self::TradesByTimestamp => cap.trades_by_timestamp,
            Self::OrdersSnapshot => cap.orders_snapshot,
            Self::Candles => cap.candles.is_enabled(),
            Self::Ticker => cap.ticker,
        }
    }
}

impl fmt::Display for EndpointFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Whether `family` should be audited given the fetched `/info`.
///
/// `/info` itself always runs. Without a fetched `/info` or a capability
/// map nothing else runs. Market-scoped families also need `markets`; a
/// missing prerequisite means skip, never fail.
pub fn should_run(family: EndpointFamily, info: Option<&Info>) -> bool {
    if family == EndpointFamily::Info {
        return true;
    }
    let Some(cap) = info.and_then(|i| i.capability.as_ref()) else {
        return false;
    };
    if family.is_market_scoped() && !cap.markets {
        return false;
    }
    family.declared(cap)
}

/// Families that will run, in suite order
pub fn plan(info: Option<&Info>) -> Vec<EndpointFamily> {
    EndpointFamily::SUITE
        .into_iter()
        .filter(|f| should_run(*f, info))
        .collect()
}
