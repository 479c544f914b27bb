use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::types::{Session, VerificationResult};

/// In-memory keyed store
///
/// Values live for the lifetime of the store; there is no deletion or expiry.
/// Cloning the store yields another handle to the same map.
#[derive(Debug)]
pub struct InMemoryStore<V> {
    entries: Arc<RwLock<HashMap<String, V>>>,
}

pub type SessionStore = InMemoryStore<Session>;
pub type ResultStore = InMemoryStore<VerificationResult>;

impl<V: Clone> InMemoryStore<V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn put(&self, id: impl Into<String>, value: V) {
        self.entries.write().await.insert(id.into(), value);
    }

    pub async fn get(&self, id: &str) -> Option<V> {
        self.entries.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Take the read lock for a consistent multi-step read
    pub async fn read(&self) -> StoreReadGuard<'_, V> {
        StoreReadGuard {
            entries: self.entries.read().await,
        }
    }

    /// Take the write lock for a multi-step update
    ///
    /// Other readers and writers wait until the returned guard is dropped.
    pub async fn write(&self) -> StoreGuard<'_, V> {
        StoreGuard {
            entries: self.entries.write().await,
        }
    }
}

impl<V> Clone for InMemoryStore<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V: Clone> Default for InMemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to a store's entries
pub struct StoreGuard<'a, V> {
    entries: RwLockWriteGuard<'a, HashMap<String, V>>,
}

impl<V> StoreGuard<'_, V> {
    pub fn put(&mut self, id: impl Into<String>, value: V) {
        self.entries.insert(id.into(), value);
    }

    pub fn get(&self, id: &str) -> Option<&V> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut V> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared read access to a store's entries
pub struct StoreReadGuard<'a, V> {
    entries: RwLockReadGuard<'a, HashMap<String, V>>,
}

impl<V> StoreReadGuard<'_, V> {
    pub fn get(&self, id: &str) -> Option<&V> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
