//! Configuration for the order query tool.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): ledger parameters
//! - CLI arguments: the store snapshot and the query to run

use std::path::PathBuf;

use clap::Parser;
use trade_query::{Ledger, types::QueryRequest};

/// Largest supported number of fractional digits.
const MAX_DECIMALS: u8 = 18;

/// Environment configuration, every field falls back to the mainnet ledger.
#[derive(Debug, Default, serde::Deserialize)]
pub struct EnvConfig {
    /// Symbol of the native coin (e.g., "bty")
    pub coin_symbol: Option<String>,

    /// Executor holding the traded tokens (e.g., "token")
    pub asset_exec: Option<String>,

    /// Executor holding the native coin (e.g., "coins")
    pub price_exec: Option<String>,

    /// Fractional digits of token amounts
    pub token_decimals: Option<u8>,

    /// Fractional digits of prices
    pub coin_decimals: Option<u8>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Ledger the snapshot was taken from.
    pub fn to_ledger(&self) -> Result<Ledger, ConfigError> {
        let mainnet = Ledger::mainnet();
        let token_decimals = decimals(
            "token_decimals",
            self.token_decimals.unwrap_or(mainnet.token_decimals()),
        )?;
        let coin_decimals = decimals(
            "coin_decimals",
            self.coin_decimals.unwrap_or(mainnet.coin_decimals()),
        )?;
        Ok(Ledger::custom(
            self.coin_symbol.as_deref().unwrap_or(mainnet.coin_symbol()),
            self.asset_exec.as_deref().unwrap_or(mainnet.asset_exec()),
            self.price_exec.as_deref().unwrap_or(mainnet.price_exec()),
            token_decimals,
            coin_decimals,
        ))
    }
}

fn decimals(name: &'static str, value: u8) -> Result<u8, ConfigError> {
    if value > MAX_DECIMALS {
        return Err(ConfigError::InvalidDecimals(name, value));
    }
    Ok(value)
}

/// CLI arguments of a single query run.
#[derive(Debug, Parser)]
#[command(name = "order-query")]
#[command(about = "Runs a trade order query against a store snapshot")]
pub struct CliConfig {
    /// JSON store snapshot (local database, state store and transactions)
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Query as JSON, e.g. '{"func_name":"GetTradeOrder","payload":{"key":"0x.."}}'
    #[arg(long)]
    pub request: String,

    /// Pretty-print the reply
    #[arg(long)]
    pub pretty: bool,
}

impl CliConfig {
    /// Parse the query to run.
    pub fn to_request(&self) -> Result<QueryRequest, ConfigError> {
        serde_json::from_str(&self.request).map_err(ConfigError::InvalidRequest)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be at most 18, got {1}")]
    InvalidDecimals(&'static str, u8),

    #[error("Invalid request: {0}")]
    InvalidRequest(serde_json::Error),
}
