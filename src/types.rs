//! Shared types for the exchange engine.
//!
//! These types form the data model used across all modules: identities,
//! fixed-point amounts, the event log, and the error taxonomy. They are
//! designed to be stable so that ledger, host, and engine modules can
//! depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// All balances, rates, and transfer amounts, in base units.
pub type Amount = u128;

/// One whole token (and one whole unit of native currency): 10^18 base
/// units. Rates are expressed at this scale as well — tokens per one unit
/// of currency.
pub const UNIT: Amount = 1_000_000_000_000_000_000;

/// Scale a whole-number amount up to base units.
pub fn whole(n: u64) -> Amount {
    n as Amount * UNIT
}

/// Render a base-unit amount as a decimal string in whole units,
/// trimming trailing zeros ("1.5" rather than "1.500000000000000000").
pub fn format_units(amount: Amount) -> String {
    let int = amount / UNIT;
    let frac = amount % UNIT;
    if frac == 0 {
        return int.to_string();
    }
    let frac = format!("{frac:018}");
    format!("{int}.{}", frac.trim_end_matches('0'))
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// An opaque account identity, shared by the token ledger and the
/// currency host. The engine itself holds one of these for its own
/// custody account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        AccountId(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        AccountId(s)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Observability events emitted by the engine. Not required for
/// correctness; balances on the ledger and host are the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ExchangeEvent {
    RateChanged {
        previous: Amount,
        current: Amount,
    },
    TokensPurchased {
        buyer: AccountId,
        tokens: Amount,
        currency_in: Amount,
    },
    TokensSold {
        seller: AccountId,
        tokens: Amount,
        currency_out: Amount,
    },
    CurrencyWithdrawn {
        to: AccountId,
        amount: Amount,
    },
}

impl fmt::Display for ExchangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeEvent::RateChanged { previous, current } => write!(
                f,
                "rate-changed: {} -> {} tokens/unit",
                format_units(*previous),
                format_units(*current),
            ),
            ExchangeEvent::TokensPurchased {
                buyer,
                tokens,
                currency_in,
            } => write!(
                f,
                "tokens-bought: {buyer} received {} tokens for {} currency",
                format_units(*tokens),
                format_units(*currency_in),
            ),
            ExchangeEvent::TokensSold {
                seller,
                tokens,
                currency_out,
            } => write!(
                f,
                "tokens-sold: {seller} sold {} tokens for {} currency",
                format_units(*tokens),
                format_units(*currency_out),
            ),
            ExchangeEvent::CurrencyWithdrawn { to, amount } => write!(
                f,
                "currency-withdrawn: {} currency to {to}",
                format_units(*amount),
            ),
        }
    }
}

/// A timestamped, uniquely identified event log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub event: ExchangeEvent,
}

impl EventRecord {
    pub fn new(event: ExchangeEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            event,
        }
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%Y-%m-%d %H:%M:%S"), self.event)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Persistable engine state: configuration plus the event log. Token and
/// currency balances live on the ledger and host and are deliberately
/// absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeSnapshot {
    pub owner: AccountId,
    pub account: AccountId,
    pub rate: Amount,
    pub events: Vec<EventRecord>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the exchange engine.
///
/// Every failure aborts the whole operation with no partial state change;
/// retries are the caller's responsibility.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("Caller `{caller}` is not the owner")]
    Unauthorized { caller: AccountId },

    #[error("Insufficient currency sent: required {required}, attached {attached}")]
    InsufficientFunds { required: Amount, attached: Amount },

    #[error("Insufficient currency in reserve: needed {needed}, available {available}")]
    InsufficientReserve { needed: Amount, available: Amount },

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Arithmetic overflow in rate conversion")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
