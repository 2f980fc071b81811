//! Error types for the order query tool.

use trade_query::error::{QueryError, StoreError};

use crate::config::ConfigError;

/// Main error type for the order query tool.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),

    #[error("Failed to read snapshot: {0}")]
    SnapshotIo(#[from] std::io::Error),

    #[error("Malformed snapshot: {0}")]
    SnapshotFormat(#[source] serde_json::Error),

    #[error("Failed to load snapshot: {0}")]
    Store(#[from] StoreError),

    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    #[error("Failed to encode reply: {0}")]
    Reply(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
