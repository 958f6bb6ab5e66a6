//! # Memory Store Adapter
//!
//! In-memory committed store for testing and single-node setups.
//! Production would commit through Subsystem 4 (State Management).

use crate::context::{StoreMap, WriteSet};
use crate::ports::outbound::CommittedStore;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Committed key/value state held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<Arc<StoreMap>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `entries`.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        let state: StoreMap = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            state: RwLock::new(Arc::new(state)),
        }
    }

    /// Read a committed value.
    pub async fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.state.read().await.get(key).cloned()
    }

    /// Number of committed keys.
    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    /// Returns true if nothing is committed.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.is_empty()
    }
}

#[async_trait]
impl CommittedStore for InMemoryStore {
    async fn snapshot(&self) -> Arc<StoreMap> {
        Arc::clone(&*self.state.read().await)
    }

    async fn apply(&self, writes: WriteSet) {
        if writes.is_empty() {
            return;
        }
        let mut guard = self.state.write().await;
        // Copy-on-write: snapshots handed out earlier stay untouched.
        let state = Arc::make_mut(&mut *guard);
        for (key, value) in writes {
            match value {
                Some(value) => {
                    state.insert(key, value);
                }
                None => {
                    state.remove(&key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_apply_writes_and_deletes() {
        let store = InMemoryStore::with_entries([(b"a".to_vec(), b"1".to_vec())]);

        let mut writes = WriteSet::new();
        writes.insert(b"a".to_vec(), None);
        writes.insert(b"b".to_vec(), Some(b"2".to_vec()));
        store.apply(writes).await;

        assert_eq!(store.get(b"a").await, None);
        assert_eq!(store.get(b"b").await, Some(b"2".to_vec()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_stable() {
        let store = InMemoryStore::with_entries([(b"k".to_vec(), b"old".to_vec())]);
        let snapshot = store.snapshot().await;

        let mut writes = WriteSet::new();
        writes.insert(b"k".to_vec(), Some(b"new".to_vec()));
        store.apply(writes).await;

        assert_eq!(snapshot.get(b"k".as_slice()), Some(&b"old".to_vec()));
        assert_eq!(store.get(b"k").await, Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn test_new_store_is_empty() {
        assert!(InMemoryStore::new().is_empty().await);
    }
}
