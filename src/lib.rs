//! SWAPDESK — rate-based token / native-currency exchange engine.
//!
//! Library crate exposing all modules for use by integration tests
//! and the demo binary.

pub mod config;
pub mod types;
pub mod ledger;
pub mod host;
pub mod engine;
pub mod storage;
