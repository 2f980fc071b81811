//! Order query tool.
//!
//! Loads a JSON store snapshot into memory, runs a single trade order query
//! against it and prints the reply as JSON.

mod config;
mod error;

use std::{path::Path, process::exit, sync::Arc};

use clap::Parser;
use tracing::{error, info};
use trade_query::{
    Ledger,
    query::QueryEngine,
    store::{MemoryStore, StoreSnapshot},
    types::{QueryReply, QueryRequest},
};

use config::{CliConfig, EnvConfig};
use error::{Error, Result};

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    let cli_config = CliConfig::parse();

    let ledger = match env_config.to_ledger() {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            exit(1);
        }
    };

    let request = match cli_config.to_request() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            exit(1);
        }
    };

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let reply = match run(ledger, &cli_config.snapshot, &request).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(%e, "Query failed");
            exit(1);
        }
    };

    let output = if cli_config.pretty {
        serde_json::to_string_pretty(&reply)
    } else {
        serde_json::to_string(&reply)
    };
    match output.map_err(Error::Reply) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            error!(%e, "Failed to print reply");
            exit(1);
        }
    }
}

async fn run(ledger: Ledger, snapshot: &Path, request: &QueryRequest) -> Result<QueryReply> {
    let store = Arc::new(load_snapshot(snapshot).await?);
    let engine = QueryEngine::new(ledger, store.clone(), store.clone(), store);
    let reply = engine.execute(request).await?;
    info!(?request, "Query answered");
    Ok(reply)
}

async fn load_snapshot(path: &Path) -> Result<MemoryStore> {
    let raw = tokio::fs::read_to_string(path).await?;
    let snapshot: StoreSnapshot = serde_json::from_str(&raw).map_err(Error::SnapshotFormat)?;
    info!(
        path = %path.display(),
        local = snapshot.local.len(),
        state = snapshot.state.len(),
        txs = snapshot.txs.len(),
        "Loaded snapshot"
    );
    Ok(MemoryStore::from_snapshot(snapshot).await?)
}
