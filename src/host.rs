//! Native-currency host seam.
//!
//! The `CurrencyHost` trait models the host environment's
//! balance-transfer primitive: accepting currency attached to a `buy`
//! call and paying currency out on `sell` / `withdraw`. The engine's
//! currency reserve is simply the host-tracked balance of the engine's
//! own account — it is never duplicated inside the engine.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::types::{AccountId, Amount};

/// Errors reported by the currency host.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    #[error("Insufficient currency balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Payment rejected: {0}")]
    Rejected(String),
}

/// Abstraction over the host's native-currency balance authority.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CurrencyHost: Send + Sync {
    /// Native-currency balance of an account.
    async fn balance_of(&self, who: &AccountId) -> Result<Amount, HostError>;

    /// Move `amount` native currency from `from` to `to`.
    async fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), HostError>;
}

// ---------------------------------------------------------------------------
// In-memory host
// ---------------------------------------------------------------------------

/// Currency host backed by an in-memory map. Used by the demo binary
/// and tests.
#[derive(Default)]
pub struct InMemoryHost {
    balances: Mutex<HashMap<AccountId, Amount>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with native currency. Test/demo helper.
    pub fn deposit(&self, who: &AccountId, amount: Amount) -> Result<(), HostError> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(who.clone()).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(HostError::Overflow)?;
        Ok(())
    }
}

#[async_trait]
impl CurrencyHost for InMemoryHost {
    async fn balance_of(&self, who: &AccountId) -> Result<Amount, HostError> {
        Ok(*self.balances.lock().unwrap().get(who).unwrap_or(&0))
    }

    async fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), HostError> {
        if amount == 0 {
            return Ok(());
        }
        let mut balances = self.balances.lock().unwrap();
        let from_balance = *balances.get(from).unwrap_or(&0);
        if from_balance < amount {
            return Err(HostError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }
        let to_balance = *balances.get(to).unwrap_or(&0);
        let new_to = to_balance.checked_add(amount).ok_or(HostError::Overflow)?;
        balances.insert(from.clone(), from_balance - amount);
        balances.insert(to.clone(), new_to);
        debug!(%from, %to, amount, "Currency transfer");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
