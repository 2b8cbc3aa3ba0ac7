// Application state (AppState)

use crate::stores::durable_kv::DurableKv;
use crate::stores::kv::{KvStore, MemoryKv};
use crate::stores::record_store::RecordStore;
use std::sync::Arc;

/// Shared application state
///
/// Generic over the key-value backend so handlers run unchanged against the
/// durable store in production and an in-memory store in tests.
pub struct AppState<K = DurableKv> {
    /// Users, applications and the session pointer
    pub store: Arc<RecordStore<K>>,
}

impl<K: KvStore> AppState<K> {
    pub fn new(store: RecordStore<K>) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

impl<K> Clone for AppState<K> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

/// State over a volatile store
pub type MemoryState = AppState<MemoryKv>;
