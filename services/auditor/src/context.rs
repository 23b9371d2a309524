//! State threaded through one audit run

use services_common::{Capability, Info, Market};

use crate::fetcher::Fetcher;

/// Base URL, fetched `/info` and fetched `/markets` for one run.
///
/// Validators run sequentially; `/info` and `/markets` validators fill the
/// snapshot that later validators read.
#[derive(Debug, Clone)]
pub struct AuditContext {
    fetcher: Fetcher,
    strict_metadata: bool,
    info: Option<Info>,
    markets: Vec<Market>,
}

impl AuditContext {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            strict_metadata: false,
            info: None,
            markets: Vec::new(),
        }
    }

    pub fn with_strict_metadata(mut self, strict: bool) -> Self {
        self.strict_metadata = strict;
        self
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn strict_metadata(&self) -> bool {
        self.strict_metadata
    }

    pub fn info(&self) -> Option<&Info> {
        self.info.as_ref()
    }

    /// Declared capabilities; empty when `/info` had none
    pub fn capability(&self) -> Capability {
        self.info
            .as_ref()
            .and_then(|i| i.capability.clone())
            .unwrap_or_default()
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub(crate) fn set_info(&mut self, info: Info) {
        self.info = Some(info);
    }

    pub(crate) fn set_markets(&mut self, markets: Vec<Market>) {
        self.markets = markets;
    }
}
