//! In-memory token ledger.
//!
//! A reference `TokenLedger` adapter backed by hash maps. Used by the
//! demo binary and tests; a production deployment would adapt whatever
//! concrete ledger service it runs against.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use super::{LedgerError, TokenLedger};
use crate::types::{AccountId, Amount};

#[derive(Default)]
struct Inner {
    balances: HashMap<AccountId, Amount>,
    /// (owner, spender) -> remaining allowance.
    allowances: HashMap<(AccountId, AccountId), Amount>,
}

/// Token ledger backed by in-memory maps. All state sits behind a
/// mutex; no lock is held across an await point.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: Mutex<Inner>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with tokens. Test/demo helper; a real ledger
    /// mints through its own supply rules.
    pub fn mint(&self, who: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        let balance = inner.balances.entry(who.clone()).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Remaining allowance from `owner` to `spender`.
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        let inner = self.inner.lock().unwrap();
        *inner
            .allowances
            .get(&(owner.clone(), spender.clone()))
            .unwrap_or(&0)
    }
}

impl Inner {
    fn balance(&self, who: &AccountId) -> Amount {
        *self.balances.get(who).unwrap_or(&0)
    }

    fn move_tokens(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let from_balance = self.balance(from);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }
        let to_balance = self.balance(to);
        let new_to = to_balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.balances.insert(from.clone(), from_balance - amount);
        self.balances.insert(to.clone(), new_to);
        Ok(())
    }
}

#[async_trait]
impl TokenLedger for InMemoryLedger {
    async fn balance_of(&self, who: &AccountId) -> Result<Amount, LedgerError> {
        Ok(self.inner.lock().unwrap().balance(who))
    }

    async fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        inner.move_tokens(from, to, amount)?;
        debug!(%from, %to, amount, "Token transfer");
        Ok(())
    }

    async fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (from.clone(), spender.clone());
        let approved = *inner.allowances.get(&key).unwrap_or(&0);
        if approved < amount {
            return Err(LedgerError::InsufficientAllowance {
                approved,
                need: amount,
            });
        }
        inner.move_tokens(from, to, amount)?;
        // Consume allowance only after the move succeeded.
        inner.allowances.insert(key, approved - amount);
        debug!(%spender, %from, %to, amount, "Delegated token transfer");
        Ok(())
    }

    async fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .allowances
            .insert((owner.clone(), spender.clone()), amount);
        debug!(%owner, %spender, amount, "Allowance set");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
