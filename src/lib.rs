//! Trade order query engine.
//!
//! # Overview
//!
//! Read side of a ledger-based token exchange. Trades are immutable ledger
//! transactions whose execution emits typed receipts, limit orders also keep a
//! live record with fill progress in the state store. The write path projects
//! committed orders into secondary indexes of a local ordered database.
//!
//! Use [`query::QueryEngine`] to list orders by token, owner or status, with
//! price-sorted pagination, and to look single orders up by their key. Orders
//! are served straight from index rows when possible, otherwise reconstructed
//! from the live record and the originating transaction's receipts.
//!
//! The engine only reads; the stores are abstracted by the traits of
//! [`store`], with [`store::MemoryStore`] as the in-memory implementation.
//!
//! # Testing
//!
//! [`testing`] module provides [`testing::TestLedger`], a fixture writer that
//! plays the ledger executor and the indexing write path against a
//! [`store::MemoryStore`].

pub mod error;
pub mod keys;
pub mod num;
pub mod query;
pub mod store;
pub mod testing;
pub mod types;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Ledger the exchange is operating on.
pub struct Ledger {
    coin_symbol: String,
    asset_exec: String,
    price_exec: String,
    token_decimals: u8,
    coin_decimals: u8,
}

impl Ledger {
    pub fn mainnet() -> Self {
        Self {
            coin_symbol: "bty".to_string(),
            asset_exec: "token".to_string(),
            price_exec: "coins".to_string(),
            token_decimals: 8,
            coin_decimals: 8,
        }
    }

    pub fn custom(
        coin_symbol: impl Into<String>,
        asset_exec: impl Into<String>,
        price_exec: impl Into<String>,
        token_decimals: u8,
        coin_decimals: u8,
    ) -> Self {
        Self {
            coin_symbol: coin_symbol.into(),
            asset_exec: asset_exec.into(),
            price_exec: price_exec.into(),
            token_decimals,
            coin_decimals,
        }
    }

    /// Symbol of the native coin all tokens are priced in.
    pub fn coin_symbol(&self) -> &str {
        &self.coin_symbol
    }

    /// Executor holding the traded tokens.
    pub fn asset_exec(&self) -> &str {
        &self.asset_exec
    }

    /// Executor holding the native coin.
    pub fn price_exec(&self) -> &str {
        &self.price_exec
    }

    pub fn token_decimals(&self) -> u8 {
        self.token_decimals
    }

    pub fn coin_decimals(&self) -> u8 {
        self.coin_decimals
    }

    /// Converter of decimal <-> fixed-point token amounts.
    pub fn token_converter(&self) -> num::Converter {
        num::Converter::new(self.token_decimals)
    }

    /// Converter of decimal <-> fixed-point prices.
    pub fn coin_converter(&self) -> num::Converter {
        num::Converter::new(self.coin_decimals)
    }
}
