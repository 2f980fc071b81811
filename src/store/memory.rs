use std::{
    collections::BTreeMap,
    ops::Bound,
    sync::atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{KvPair, LocalDb, StateDb, TxResults};
use crate::{
    error::StoreError,
    types::{Direction, TxHash, TxResult},
};

/// In-memory implementation of all engine collaborators.
///
/// The local database is a single ordered map, the state store and the
/// transaction results are hash maps. Writes are only exposed for fixtures
/// and snapshot loading, the engine itself never writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    local: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    state: DashMap<Vec<u8>, Vec<u8>>,
    txs: DashMap<TxHash, TxResult>,
    failing: AtomicBool,
}

/// Serializable content of a [`MemoryStore`], keys and values as text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub local: BTreeMap<String, String>,
    pub state: BTreeMap<String, String>,
    pub txs: Vec<TxResult>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store from its snapshot. Fails on a malformed transaction hash.
    pub async fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let store = Self::new();
        for (key, value) in snapshot.local {
            store.put_local(key.into_bytes(), value.into_bytes()).await;
        }
        for (key, value) in snapshot.state {
            store.put_state(key.into_bytes(), value.into_bytes());
        }
        for tx in snapshot.txs {
            store.put_tx(tx)?;
        }
        Ok(store)
    }

    /// Dumps the store content.
    pub async fn snapshot(&self) -> StoreSnapshot {
        let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
        StoreSnapshot {
            local: self
                .local
                .read()
                .await
                .iter()
                .map(|(k, v)| (text(k), text(v)))
                .collect(),
            state: self
                .state
                .iter()
                .map(|e| (text(e.key()), text(e.value())))
                .collect(),
            txs: self.txs.iter().map(|e| e.value().clone()).collect(),
        }
    }

    pub async fn put_local(&self, key: Vec<u8>, value: Vec<u8>) {
        self.local.write().await.insert(key, value);
    }

    pub async fn delete_local(&self, key: &[u8]) {
        self.local.write().await.remove(key);
    }

    pub fn put_state(&self, key: Vec<u8>, value: Vec<u8>) {
        self.state.insert(key, value);
    }

    pub fn delete_state(&self, key: &[u8]) {
        self.state.remove(key);
    }

    /// Stores a transaction result under its own hash.
    pub fn put_tx(&self, tx: TxResult) -> Result<(), StoreError> {
        let hash = tx
            .tx_hash
            .parse::<TxHash>()
            .map_err(|e| StoreError::Io(format!("tx hash {:?}: {e}", tx.tx_hash)))?;
        self.txs.insert(hash, tx);
        Ok(())
    }

    /// Makes every subsequent read fail with [`StoreError::Io`] (or succeed
    /// again), to exercise error propagation.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(StoreError::Io("store unavailable".to_string()));
        }
        Ok(())
    }
}

impl LocalDb for MemoryStore {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        self.check()?;
        self.local
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(
        &self,
        prefix: &[u8],
        start: Option<&[u8]>,
        limit: usize,
        direction: Direction,
    ) -> Result<Vec<KvPair>, StoreError> {
        self.check()?;
        let limit = if limit == 0 { usize::MAX } else { limit };
        let local = self.local.read().await;
        let matching = local
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix));
        let rows: Vec<KvPair> = match direction {
            Direction::Ascending => matching
                .filter(|(k, _)| start.is_none_or(|s| k.as_slice() > s))
                .take(limit)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            Direction::Descending => matching
                .filter(|(k, _)| start.is_none_or(|s| k.as_slice() < s))
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .take(limit)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows)
    }
}

impl StateDb for MemoryStore {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        self.check()?;
        self.state
            .get(key)
            .map(|v| v.value().clone())
            .ok_or(StoreError::NotFound)
    }
}

impl TxResults for MemoryStore {
    async fn tx_result(&self, hash: TxHash) -> Result<TxResult, StoreError> {
        self.check()?;
        self.txs
            .get(&hash)
            .map(|tx| tx.value().clone())
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    async fn store_with(keys: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for key in keys {
            store
                .put_local(key.as_bytes().to_vec(), key.as_bytes().to_vec())
                .await;
        }
        store
    }

    fn keys(rows: Vec<KvPair>) -> Vec<String> {
        rows.into_iter()
            .map(|(k, _)| String::from_utf8(k).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_list_respects_prefix_and_direction() {
        let store = store_with(&["a:1", "a:2", "a:3", "b:1", "a"]).await;

        let rows = assert_ok!(store.list(b"a:", None, 0, Direction::Ascending).await);
        assert_eq!(keys(rows), vec!["a:1", "a:2", "a:3"]);

        let rows = assert_ok!(store.list(b"a:", None, 2, Direction::Descending).await);
        assert_eq!(keys(rows), vec!["a:3", "a:2"]);
    }

    #[tokio::test]
    async fn test_list_start_is_exclusive() {
        let store = store_with(&["a:1", "a:2", "a:3", "a:4"]).await;
        store.delete_local(b"a:4").await;

        let rows = assert_ok!(
            store
                .list(b"a:", Some(b"a:1"), 0, Direction::Ascending)
                .await
        );
        assert_eq!(keys(rows), vec!["a:2", "a:3"]);

        let rows = assert_ok!(
            store
                .list(b"a:", Some(b"a:3"), 1, Direction::Descending)
                .await
        );
        assert_eq!(keys(rows), vec!["a:2"]);

        let err = assert_err!(
            store
                .list(b"a:", Some(b"a:3"), 0, Direction::Ascending)
                .await
        );
        assert_eq!(err, StoreError::NotFound);
    }

    #[tokio::test]
    async fn test_empty_prefix_is_not_found() {
        let store = store_with(&["a:1"]).await;
        let err = assert_err!(store.list(b"b:", None, 10, Direction::Ascending).await);
        assert_eq!(err, StoreError::NotFound);
        assert_eq!(
            LocalDb::get(&store, b"zz").await,
            Err(StoreError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = store_with(&["a:1"]).await;
        store.set_failing(true);
        assert!(matches!(
            store.list(b"a:", None, 0, Direction::Ascending).await,
            Err(StoreError::Io(_))
        ));
        store.set_failing(false);
        assert_ok!(store.list(b"a:", None, 0, Direction::Ascending).await);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let store = store_with(&["a:1"]).await;
        store.put_state(b"mavl-trade-sell-01".to_vec(), b"{}".to_vec());
        assert_ok!(store.put_tx(TxResult {
            tx_hash: "0x2cbe1b7bd2e04ef3cb17cc1cd4b1bf91b99d7e7a3e82f1c8f3f8e3b5a8e0c111"
                .to_string(),
            height: 3,
            block_time: 1000,
            logs: vec![],
        }));
        assert!(store.put_tx(TxResult {
            tx_hash: "nope".to_string(),
            height: 3,
            block_time: 1000,
            logs: vec![],
        })
        .is_err());

        let snapshot = store.snapshot().await;
        let restored = assert_ok!(MemoryStore::from_snapshot(snapshot.clone()).await);
        assert_eq!(restored.snapshot().await, snapshot);
        assert_eq!(snapshot.txs.len(), 1);
    }
}
