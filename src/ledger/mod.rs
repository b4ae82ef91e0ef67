//! Token Account Service seam.
//!
//! Defines the `TokenLedger` trait — the narrow capability set the engine
//! needs from an external fungible-token ledger — and provides an
//! in-memory reference adapter. The engine never duplicates token
//! balances; the ledger is the single source of truth for them.

pub mod memory;

use async_trait::async_trait;

use crate::types::{AccountId, Amount};

/// Errors reported by a token ledger.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("Insufficient token balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Insufficient allowance: approved {approved}, need {need}")]
    InsufficientAllowance { approved: Amount, need: Amount },

    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Abstraction over the external fungible-token ledger.
///
/// Implementors hold balance truth. `transfer` moves tokens the acting
/// account owns; `transfer_from` moves tokens on behalf of another
/// account, consuming an allowance previously granted via `approve`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Token balance of an account.
    async fn balance_of(&self, who: &AccountId) -> Result<Amount, LedgerError>;

    /// Move `amount` tokens from `from` to `to`.
    async fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Move `amount` tokens from `from` to `to`, acting as `spender`.
    /// Requires `from` to have approved `spender` for at least `amount`.
    async fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Grant `spender` the right to move up to `amount` of `owner`'s
    /// tokens via `transfer_from`. Replaces any prior allowance.
    async fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError>;
}
