//! SWAPDESK — rate-based token / native-currency exchange engine.
//!
//! Demo entry point. Loads configuration, initialises structured
//! logging, restores the exchange snapshot from disk (or creates fresh),
//! seeds the in-memory ledger and host, and runs a scripted
//! buy → set-rate → sell → withdraw session.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use swapdesk::config::AppConfig;
use swapdesk::engine::{Exchange, ExchangeParams};
use swapdesk::host::{CurrencyHost, InMemoryHost};
use swapdesk::ledger::memory::InMemoryLedger;
use swapdesk::ledger::TokenLedger;
use swapdesk::storage;
use swapdesk::types::{format_units, whole, AccountId, UNIT};

const BANNER: &str = r#"
 ______        ___    ____  ____  _____ ____  _  __
/ ___\ \      / / \  |  _ \|  _ \| ____/ ___|| |/ /
\___ \\ \ /\ / / _ \ | |_) | | | |  _| \___ \| ' /
 ___) |\ V  V / ___ \|  __/| |_| | |___ ___) | . \
|____/  \_/\_/_/   \_\_|   |____/|_____|____/|_|\_\

  Rate-Based Token Exchange Engine
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured logging, RUST_LOG-overridable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("{BANNER}");

    let cfg = AppConfig::load("config.toml")?;
    info!(
        owner = %cfg.exchange.owner,
        account = %cfg.exchange.account,
        rate = cfg.exchange.initial_rate,
        token = %cfg.token.symbol,
        "Starting up"
    );

    // -- External collaborators ------------------------------------------

    let ledger = Arc::new(InMemoryLedger::new());
    let host = Arc::new(InMemoryHost::new());

    let engine_account = cfg.exchange.account_id();
    let owner = cfg.exchange.owner_id();
    let alice = AccountId::from("alice");

    // Pre-fund the engine with token inventory and the demo user with
    // currency. Inventory for `buy` is only ever funded out of band.
    ledger.mint(&engine_account, whole(cfg.demo.engine_tokens))?;
    host.deposit(&alice, whole(cfg.demo.user_currency))?;

    // -- Restore or create the exchange ----------------------------------

    let state_file = cfg.demo.state_file.as_deref();
    let mut exchange = match storage::load_snapshot(state_file)? {
        Some(snapshot) => {
            info!(rate = %format_units(snapshot.rate), "Resumed from saved snapshot");
            Exchange::restore(snapshot, ledger.clone(), host.clone())?
        }
        None => Exchange::new(
            ExchangeParams {
                owner: owner.clone(),
                account: engine_account.clone(),
                initial_rate: cfg.exchange.initial_rate_scaled(),
            },
            ledger.clone(),
            host.clone(),
        )?,
    };

    // -- Scripted session -------------------------------------------------

    // Alice buys 100 tokens for 0.1 units of currency.
    let paid = exchange.buy(&alice, whole(100), UNIT / 10).await?;
    info!(paid = %format_units(paid), "Buy settled");

    // The owner adjusts the rate.
    exchange.set_rate(&owner, whole(1200))?;

    // Alice approves the engine and sells her tokens back.
    ledger.approve(&alice, &engine_account, whole(100)).await?;
    let received = exchange.sell(&alice, whole(100)).await?;
    info!(received = %format_units(received), "Sell settled");

    // The owner withdraws whatever currency the session accumulated.
    let reserve = exchange.reserve().await?;
    if reserve > 0 {
        exchange.withdraw(&owner, reserve).await?;
    }

    // -- Summary ----------------------------------------------------------

    info!(
        alice_tokens = %format_units(ledger.balance_of(&alice).await?),
        alice_currency = %format_units(host.balance_of(&alice).await?),
        owner_currency = %format_units(host.balance_of(&owner).await?),
        inventory = %format_units(exchange.token_inventory().await?),
        reserve = %format_units(exchange.reserve().await?),
        "Session complete"
    );
    for record in exchange.events() {
        println!("  {record}");
    }

    storage::save_snapshot(&exchange.snapshot(), state_file)?;
    Ok(())
}
