//! The exchange engine.
//!
//! Holds the owner/rate state and custody account, delegates token
//! balance truth to the `TokenLedger` and currency balance truth to the
//! `CurrencyHost`, and keeps every operation all-or-nothing: the
//! reversible leg runs first, and if the second leg fails the first is
//! compensated before the error surfaces.

use std::sync::Arc;
use tracing::{info, warn};

use crate::engine::convert;
use crate::host::CurrencyHost;
use crate::ledger::TokenLedger;
use crate::types::{
    AccountId, Amount, EventRecord, ExchangeError, ExchangeEvent, ExchangeSnapshot, format_units,
};

/// Construction parameters for an [`Exchange`].
#[derive(Debug, Clone)]
pub struct ExchangeParams {
    /// The single identity allowed to change the rate or withdraw reserve.
    pub owner: AccountId,
    /// The engine's own account on both the ledger and the host.
    pub account: AccountId,
    /// Initial rate: tokens per unit of currency, at `UNIT` scale.
    pub initial_rate: Amount,
}

/// Rate-based token / native-currency exchange.
///
/// One instance per deployment; the `&mut self` receivers model the
/// host's one-operation-at-a-time serialization.
pub struct Exchange {
    owner: AccountId,
    account: AccountId,
    rate: Amount,
    ledger: Arc<dyn TokenLedger>,
    host: Arc<dyn CurrencyHost>,
    events: Vec<EventRecord>,
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("owner", &self.owner)
            .field("account", &self.account)
            .field("rate", &self.rate)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Exchange {
    pub fn new(
        params: ExchangeParams,
        ledger: Arc<dyn TokenLedger>,
        host: Arc<dyn CurrencyHost>,
    ) -> Result<Self, ExchangeError> {
        Self::validate(&params)?;
        info!(
            owner = %params.owner,
            account = %params.account,
            rate = %format_units(params.initial_rate),
            "Exchange created"
        );
        Ok(Self {
            owner: params.owner,
            account: params.account,
            rate: params.initial_rate,
            ledger,
            host,
            events: Vec::new(),
        })
    }

    /// Rebuild an engine from a saved snapshot, re-attaching the live
    /// ledger and host.
    pub fn restore(
        snapshot: ExchangeSnapshot,
        ledger: Arc<dyn TokenLedger>,
        host: Arc<dyn CurrencyHost>,
    ) -> Result<Self, ExchangeError> {
        let params = ExchangeParams {
            owner: snapshot.owner,
            account: snapshot.account,
            initial_rate: snapshot.rate,
        };
        Self::validate(&params)?;
        Ok(Self {
            owner: params.owner,
            account: params.account,
            rate: params.initial_rate,
            ledger,
            host,
            events: snapshot.events,
        })
    }

    fn validate(params: &ExchangeParams) -> Result<(), ExchangeError> {
        if params.initial_rate == 0 {
            return Err(ExchangeError::InvalidConfig(
                "rate must be greater than zero".to_string(),
            ));
        }
        if params.owner.is_empty() || params.account.is_empty() {
            return Err(ExchangeError::InvalidConfig(
                "owner and engine account must be non-empty".to_string(),
            ));
        }
        if params.owner == params.account {
            return Err(ExchangeError::InvalidConfig(
                "engine account must be distinct from the owner".to_string(),
            ));
        }
        Ok(())
    }

    // -- Operations ------------------------------------------------------

    /// Buy `token_amount` tokens, attaching `attached` native currency.
    ///
    /// The caller must attach at least `token_amount * UNIT / rate`
    /// currency. The full attached amount is collected into the reserve;
    /// excess above the requirement is not refunded. Returns the
    /// required currency amount.
    pub async fn buy(
        &mut self,
        caller: &AccountId,
        token_amount: Amount,
        attached: Amount,
    ) -> Result<Amount, ExchangeError> {
        if token_amount == 0 {
            return Err(ExchangeError::ZeroAmount);
        }
        let required = convert::currency_for_tokens(token_amount, self.rate)?;
        if attached < required {
            return Err(ExchangeError::InsufficientFunds { required, attached });
        }

        // Currency leg first: it can be reversed in-process if the token
        // leg fails.
        self.host
            .transfer(caller, &self.account, attached)
            .await
            .map_err(|e| ExchangeError::TransferFailed(e.to_string()))?;

        if let Err(e) = self
            .ledger
            .transfer(&self.account, caller, token_amount)
            .await
        {
            if let Err(refund) = self.host.transfer(&self.account, caller, attached).await {
                warn!(
                    %caller,
                    attached,
                    error = %refund,
                    "Refund after failed token delivery also failed"
                );
            }
            return Err(ExchangeError::TransferFailed(e.to_string()));
        }

        info!(
            buyer = %caller,
            tokens = %format_units(token_amount),
            currency_in = %format_units(attached),
            required = %format_units(required),
            "Tokens purchased"
        );
        self.record(ExchangeEvent::TokensPurchased {
            buyer: caller.clone(),
            tokens: token_amount,
            currency_in: attached,
        });
        Ok(required)
    }

    /// Sell `token_amount` tokens back for native currency at the
    /// current rate. Requires the caller to have approved the engine
    /// account for at least `token_amount` on the ledger. Returns the
    /// currency paid out.
    pub async fn sell(
        &mut self,
        caller: &AccountId,
        token_amount: Amount,
    ) -> Result<Amount, ExchangeError> {
        if token_amount == 0 {
            return Err(ExchangeError::ZeroAmount);
        }
        let owed = convert::currency_for_tokens(token_amount, self.rate)?;

        let reserve = self.reserve().await?;
        if reserve < owed {
            return Err(ExchangeError::InsufficientReserve {
                needed: owed,
                available: reserve,
            });
        }

        // Token leg first: a plain transfer back reverses it if the
        // payout fails.
        self.ledger
            .transfer_from(&self.account, caller, &self.account, token_amount)
            .await
            .map_err(|e| ExchangeError::TransferFailed(e.to_string()))?;

        if let Err(e) = self.host.transfer(&self.account, caller, owed).await {
            if let Err(undo) = self
                .ledger
                .transfer(&self.account, caller, token_amount)
                .await
            {
                warn!(
                    %caller,
                    token_amount,
                    error = %undo,
                    "Token return after failed payout also failed"
                );
            }
            return Err(ExchangeError::TransferFailed(e.to_string()));
        }

        info!(
            seller = %caller,
            tokens = %format_units(token_amount),
            currency_out = %format_units(owed),
            "Tokens sold"
        );
        self.record(ExchangeEvent::TokensSold {
            seller: caller.clone(),
            tokens: token_amount,
            currency_out: owed,
        });
        Ok(owed)
    }

    /// Replace the conversion rate. Owner only; the new rate must be
    /// greater than zero.
    pub fn set_rate(&mut self, caller: &AccountId, new_rate: Amount) -> Result<(), ExchangeError> {
        self.require_owner(caller)?;
        if new_rate == 0 {
            return Err(ExchangeError::InvalidConfig(
                "rate must be greater than zero".to_string(),
            ));
        }
        let previous = self.rate;
        self.rate = new_rate;
        info!(
            previous = %format_units(previous),
            current = %format_units(new_rate),
            "Rate changed"
        );
        self.record(ExchangeEvent::RateChanged {
            previous,
            current: new_rate,
        });
        Ok(())
    }

    /// Pay `amount` of the currency reserve out to the owner. Owner only.
    pub async fn withdraw(
        &mut self,
        caller: &AccountId,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        self.require_owner(caller)?;
        let reserve = self.reserve().await?;
        if reserve < amount {
            return Err(ExchangeError::InsufficientReserve {
                needed: amount,
                available: reserve,
            });
        }
        self.host
            .transfer(&self.account, &self.owner, amount)
            .await
            .map_err(|e| ExchangeError::TransferFailed(e.to_string()))?;

        info!(to = %self.owner, amount = %format_units(amount), "Currency withdrawn");
        self.record(ExchangeEvent::CurrencyWithdrawn {
            to: self.owner.clone(),
            amount,
        });
        Ok(())
    }

    // -- Queries ---------------------------------------------------------

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn rate(&self) -> Amount {
        self.rate
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// The token ledger this engine settles against.
    pub fn ledger(&self) -> &Arc<dyn TokenLedger> {
        &self.ledger
    }

    /// The native-currency reserve: the host balance of the engine's own
    /// account. Never tracked separately inside the engine.
    pub async fn reserve(&self) -> Result<Amount, ExchangeError> {
        self.host
            .balance_of(&self.account)
            .await
            .map_err(|e| ExchangeError::TransferFailed(e.to_string()))
    }

    /// Tokens held by the engine's own account, available for `buy`.
    pub async fn token_inventory(&self) -> Result<Amount, ExchangeError> {
        self.ledger
            .balance_of(&self.account)
            .await
            .map_err(|e| ExchangeError::TransferFailed(e.to_string()))
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn snapshot(&self) -> ExchangeSnapshot {
        ExchangeSnapshot {
            owner: self.owner.clone(),
            account: self.account.clone(),
            rate: self.rate,
            events: self.events.clone(),
        }
    }

    // -- Internals -------------------------------------------------------

    fn require_owner(&self, caller: &AccountId) -> Result<(), ExchangeError> {
        if caller != &self.owner {
            return Err(ExchangeError::Unauthorized {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    fn record(&mut self, event: ExchangeEvent) {
        self.events.push(EventRecord::new(event));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
