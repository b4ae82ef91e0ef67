//! End-to-end exchange lifecycle tests.
//!
//! Covers the full public surface against live in-memory collaborators:
//! deployment queries, buying, selling, rate updates, withdrawals, and
//! the compensation paths under an injected ledger fault.

use std::sync::Arc;

use swapdesk::engine::{Exchange, ExchangeParams};
use swapdesk::host::{CurrencyHost, InMemoryHost};
use swapdesk::ledger::memory::InMemoryLedger;
use swapdesk::ledger::TokenLedger;
use swapdesk::types::{whole, AccountId, ExchangeError, ExchangeEvent, UNIT};

use crate::mock_ledger::FaultyLedger;

fn acct(s: &str) -> AccountId {
    AccountId::from(s)
}

fn params() -> ExchangeParams {
    ExchangeParams {
        owner: acct("owner"),
        account: acct("exchange"),
        initial_rate: whole(1000),
    }
}

/// A deployed world: the exchange holds 500k tokens of inventory, the
/// demo user `addr1` holds 5 units of currency.
fn deploy() -> (Exchange, Arc<InMemoryLedger>, Arc<InMemoryHost>) {
    let ledger = Arc::new(InMemoryLedger::new());
    let host = Arc::new(InMemoryHost::new());
    ledger.mint(&acct("exchange"), whole(500_000)).unwrap();
    host.deposit(&acct("addr1"), whole(5)).unwrap();
    let exchange = Exchange::new(params(), ledger.clone(), host.clone()).unwrap();
    (exchange, ledger, host)
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deployment_sets_owner_rate_and_inventory() {
    let (exchange, _, _) = deploy();

    assert_eq!(exchange.owner(), &acct("owner"));
    assert_eq!(exchange.rate(), whole(1000));
    assert_eq!(exchange.account(), &acct("exchange"));
    assert_eq!(exchange.token_inventory().await.unwrap(), whole(500_000));
    assert_eq!(exchange.reserve().await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Buying
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_buys_tokens_for_currency() {
    let (mut exchange, ledger, _) = deploy();

    exchange
        .buy(&acct("addr1"), whole(100), UNIT / 10)
        .await
        .unwrap();

    assert_eq!(ledger.balance_of(&acct("addr1")).await.unwrap(), whole(100));
    assert_eq!(exchange.reserve().await.unwrap(), UNIT / 10);
}

#[tokio::test]
async fn buy_rejects_insufficient_currency() {
    let (mut exchange, ledger, _) = deploy();

    let err = exchange
        .buy(&acct("addr1"), whole(100), UNIT / 20)
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::InsufficientFunds { .. }));
    assert_eq!(ledger.balance_of(&acct("addr1")).await.unwrap(), 0);
    assert_eq!(exchange.reserve().await.unwrap(), 0);
}

#[tokio::test]
async fn buy_beyond_inventory_refunds_currency() {
    let (mut exchange, ledger, host) = deploy();
    host.deposit(&acct("addr1"), whole(595)).unwrap(); // 600 total

    // More tokens than the engine holds; the currency leg is reversed.
    let err = exchange
        .buy(&acct("addr1"), whole(600_000), whole(600))
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::TransferFailed(_)));
    assert_eq!(host.balance_of(&acct("addr1")).await.unwrap(), whole(600));
    assert_eq!(
        ledger.balance_of(&acct("exchange")).await.unwrap(),
        whole(500_000)
    );
    assert_eq!(exchange.reserve().await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Selling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_sells_tokens_for_currency() {
    let (mut exchange, ledger, host) = deploy();

    // addr1 acquires tokens, approves the engine, and sells them back.
    exchange
        .buy(&acct("addr1"), whole(100), UNIT / 10)
        .await
        .unwrap();
    ledger
        .approve(&acct("addr1"), &acct("exchange"), whole(100))
        .await
        .unwrap();

    let received = exchange.sell(&acct("addr1"), whole(100)).await.unwrap();

    assert_eq!(received, UNIT / 10);
    assert_eq!(ledger.balance_of(&acct("addr1")).await.unwrap(), 0);
    assert_eq!(host.balance_of(&acct("addr1")).await.unwrap(), whole(5));
}

#[tokio::test]
async fn sell_rejects_when_reserve_is_short() {
    let (mut exchange, ledger, host) = deploy();

    // addr1 holds a large token balance but the reserve is empty.
    ledger.mint(&acct("addr1"), whole(100_000)).unwrap();
    ledger
        .approve(&acct("addr1"), &acct("exchange"), whole(100_000))
        .await
        .unwrap();

    let err = exchange
        .sell(&acct("addr1"), whole(100_000))
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::InsufficientReserve { .. }));
    assert_eq!(
        ledger.balance_of(&acct("addr1")).await.unwrap(),
        whole(100_000)
    );
    assert_eq!(host.balance_of(&acct("addr1")).await.unwrap(), whole(5));
}

// ---------------------------------------------------------------------------
// Rate updates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn owner_updates_rate() {
    let (mut exchange, _, _) = deploy();

    exchange.set_rate(&acct("owner"), whole(1200)).unwrap();

    assert_eq!(exchange.rate(), whole(1200));
    assert!(matches!(
        exchange.events().last().unwrap().event,
        ExchangeEvent::RateChanged { current, .. } if current == whole(1200)
    ));
}

#[tokio::test]
async fn non_owner_cannot_update_rate() {
    let (mut exchange, _, _) = deploy();

    let err = exchange.set_rate(&acct("addr1"), whole(1200)).unwrap_err();

    assert!(matches!(err, ExchangeError::Unauthorized { .. }));
    assert_eq!(exchange.rate(), whole(1000));
}

// ---------------------------------------------------------------------------
// Withdrawals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn owner_withdraws_accumulated_currency() {
    let (mut exchange, _, host) = deploy();

    exchange
        .buy(&acct("addr1"), whole(1000), whole(1))
        .await
        .unwrap();
    exchange.withdraw(&acct("owner"), whole(1)).await.unwrap();

    assert_eq!(host.balance_of(&acct("owner")).await.unwrap(), whole(1));
    assert_eq!(exchange.reserve().await.unwrap(), 0);
}

#[tokio::test]
async fn non_owner_cannot_withdraw() {
    let (mut exchange, _, _) = deploy();

    let err = exchange
        .withdraw(&acct("addr1"), whole(1))
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::Unauthorized { .. }));
}

// ---------------------------------------------------------------------------
// Round trip & event trail
// ---------------------------------------------------------------------------

#[tokio::test]
async fn round_trip_with_exact_attachment_restores_balances() {
    let (mut exchange, ledger, host) = deploy();

    let paid = exchange
        .buy(&acct("addr1"), whole(100), UNIT / 10)
        .await
        .unwrap();
    ledger
        .approve(&acct("addr1"), &acct("exchange"), whole(100))
        .await
        .unwrap();
    let received = exchange.sell(&acct("addr1"), whole(100)).await.unwrap();

    // Both legs price through the same truncating division, so an exact
    // attachment round-trips without residual.
    assert_eq!(paid, received);
    assert_eq!(host.balance_of(&acct("addr1")).await.unwrap(), whole(5));
    assert_eq!(
        ledger.balance_of(&acct("exchange")).await.unwrap(),
        whole(500_000)
    );

    let kinds: Vec<_> = exchange
        .events()
        .iter()
        .map(|r| match r.event {
            ExchangeEvent::TokensPurchased { .. } => "buy",
            ExchangeEvent::TokensSold { .. } => "sell",
            ExchangeEvent::RateChanged { .. } => "rate",
            ExchangeEvent::CurrencyWithdrawn { .. } => "withdraw",
        })
        .collect();
    assert_eq!(kinds, vec!["buy", "sell"]);
}

#[tokio::test]
async fn overpaid_buy_is_kept_by_the_reserve() {
    let (mut exchange, _, host) = deploy();

    // addr1 attaches 1 unit for tokens worth 0.1; the excess stays.
    exchange
        .buy(&acct("addr1"), whole(100), whole(1))
        .await
        .unwrap();

    assert_eq!(exchange.reserve().await.unwrap(), whole(1));
    assert_eq!(host.balance_of(&acct("addr1")).await.unwrap(), whole(4));
}

// ---------------------------------------------------------------------------
// Ledger fault injection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ledger_outage_aborts_buy_and_refunds() {
    let ledger = Arc::new(FaultyLedger::new());
    let host = Arc::new(InMemoryHost::new());
    ledger.mint(&acct("exchange"), whole(500_000)).unwrap();
    host.deposit(&acct("addr1"), whole(5)).unwrap();
    let mut exchange = Exchange::new(params(), ledger.clone(), host.clone()).unwrap();

    ledger.set_error("ledger offline");
    let err = exchange
        .buy(&acct("addr1"), whole(100), UNIT / 10)
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::TransferFailed(_)));
    assert_eq!(host.balance_of(&acct("addr1")).await.unwrap(), whole(5));
    assert_eq!(exchange.reserve().await.unwrap(), 0);

    // Once the ledger recovers the same call succeeds.
    ledger.clear_error();
    exchange
        .buy(&acct("addr1"), whole(100), UNIT / 10)
        .await
        .unwrap();
    assert_eq!(ledger.balance_of(&acct("addr1")).await.unwrap(), whole(100));
}
