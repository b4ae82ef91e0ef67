//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs for
//! the demo binary: exchange identities and initial rate, token
//! metadata, and the seed balances for the in-memory ledger and host.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::types::{whole, AccountId, Amount};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub token: TokenConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    /// Identity allowed to change the rate and withdraw the reserve.
    pub owner: String,
    /// The engine's own account on the ledger and the host.
    pub account: String,
    /// Initial rate in whole tokens per unit of currency.
    pub initial_rate: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DemoConfig {
    /// Tokens minted to the engine account at startup (whole tokens).
    pub engine_tokens: u64,
    /// Currency deposited to each demo user at startup (whole units).
    pub user_currency: u64,
    /// Snapshot file path; omit to use the default.
    #[serde(default)]
    pub state_file: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}

impl ExchangeConfig {
    pub fn owner_id(&self) -> AccountId {
        AccountId::from(self.owner.as_str())
    }

    pub fn account_id(&self) -> AccountId {
        AccountId::from(self.account.as_str())
    }

    /// Initial rate scaled to base units.
    pub fn initial_rate_scaled(&self) -> Amount {
        whole(self.initial_rate)
    }
}
