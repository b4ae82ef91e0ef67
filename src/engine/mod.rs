//! Core engine — rate conversion math and the exchange itself.

pub mod convert;
pub mod exchange;

pub use exchange::{Exchange, ExchangeParams};
