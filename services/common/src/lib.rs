//! Common wire records, errors and configuration for the exchange auditor

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

pub use config::*;
pub use errors::*;
pub use types::*;
