//! Test utilities for the exchange auditor
//!
//! - JSON fixtures for every adapter endpoint
//! - A wiremock-backed mock exchange serving those fixtures
//! - Logging, timeout and port helpers

pub mod fixtures;
pub mod helpers;
pub mod mocks;

pub use fixtures::*;
pub use helpers::*;
pub use mocks::*;
