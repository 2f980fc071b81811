//! Collaborator interfaces of the query engine.
//!
//! The engine reads three stores, all owned by the host:
//!
//! * [`LocalDb`] - ordered local database holding the order table, its
//!   secondary indexes and the owner key lists;
//! * [`StateDb`] - state store holding live limit orders by ID;
//! * [`TxResults`] - committed transactions with their execution logs.
//!
//! [`MemoryStore`] implements all three in memory.

mod memory;

use std::{future::Future, sync::Arc};

pub use memory::{MemoryStore, StoreSnapshot};

use crate::{
    error::StoreError,
    types::{Direction, TxHash, TxResult},
};

/// Key-value pair returned by [`LocalDb::list`].
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Ordered local database.
pub trait LocalDb {
    /// Value stored under the key.
    fn get(&self, key: &[u8]) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;

    /// Entries with keys starting with `prefix`, in key order.
    ///
    /// `start`, when set, is exclusive: ascending scans return keys strictly
    /// greater than it, descending scans keys strictly less than it.
    /// `limit == 0` means no limit. Fails with [`StoreError::NotFound`] when
    /// nothing matches.
    fn list(
        &self,
        prefix: &[u8],
        start: Option<&[u8]>,
        limit: usize,
        direction: Direction,
    ) -> impl Future<Output = Result<Vec<KvPair>, StoreError>> + Send;
}

/// State store of live limit orders.
pub trait StateDb {
    /// Encoded entity stored under the key.
    fn get(&self, key: &[u8]) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;
}

/// Source of committed transaction results.
pub trait TxResults {
    /// Execution result of a committed transaction.
    fn tx_result(&self, hash: TxHash) -> impl Future<Output = Result<TxResult, StoreError>> + Send;
}

impl<T: LocalDb + Send + Sync> LocalDb for Arc<T> {
    fn get(&self, key: &[u8]) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send {
        LocalDb::get(&**self, key)
    }

    fn list(
        &self,
        prefix: &[u8],
        start: Option<&[u8]>,
        limit: usize,
        direction: Direction,
    ) -> impl Future<Output = Result<Vec<KvPair>, StoreError>> + Send {
        (**self).list(prefix, start, limit, direction)
    }
}

impl<T: StateDb + Send + Sync> StateDb for Arc<T> {
    fn get(&self, key: &[u8]) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send {
        StateDb::get(&**self, key)
    }
}

impl<T: TxResults + Send + Sync> TxResults for Arc<T> {
    fn tx_result(&self, hash: TxHash) -> impl Future<Output = Result<TxResult, StoreError>> + Send {
        (**self).tx_result(hash)
    }
}
