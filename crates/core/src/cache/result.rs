//! Persistent result cache.
//!
//! Maps a full host hash to the blocklist name the backend reported for it, or
//! to [`ALLOW_SENTINEL`] when the host was checked and found clean. Entries are
//! kept in a bounded LRU and mirrored to storage under [`SB_LRU_CACHE_KEY`] as a
//! JSON array ordered from least to most recently used.
//!
//! Persistence is best-effort: a failed flush is logged and the in-memory
//! state stays authoritative.

use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::Error;
use crate::storage::{SB_LRU_CACHE_KEY, Storage};

/// Value meaning "checked and not on any blocklist".
pub const ALLOW_SENTINEL: &str = "allowlist";

/// Default number of entries kept.
pub const RESULT_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

/// The cache is flushed to storage after this many writes.
pub const SAVE_EVERY_WRITES: u64 = 20;

/// One persisted cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub key: String,
    pub value: String,
}

struct State {
    entries: LruCache<String, String>,
    writes: u64,
}

impl State {
    fn records(&self) -> Vec<CacheRecord> {
        self.entries
            .iter()
            .rev()
            .map(|(key, value)| CacheRecord { key: key.clone(), value: value.clone() })
            .collect()
    }
}

pub struct ResultCache {
    state: Mutex<State>,
    storage: Arc<dyn Storage>,
}

impl ResultCache {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_capacity(storage, RESULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(storage: Arc<dyn Storage>, capacity: NonZeroUsize) -> Self {
        Self { state: Mutex::new(State { entries: LruCache::new(capacity), writes: 0 }), storage }
    }

    /// Restore entries from storage.
    ///
    /// A missing record leaves the cache empty. An unreadable or corrupt record
    /// is logged and ignored.
    pub async fn init(&self) {
        let stored = match self.storage.get(SB_LRU_CACHE_KEY).await {
            Ok(Some(json)) => json,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read safebrowsing cache from storage");
                return;
            }
        };

        let records: Vec<CacheRecord> = match serde_json::from_str(&stored) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupt safebrowsing cache");
                return;
            }
        };

        let mut state = self.state.lock().await;
        for record in records {
            state.entries.put(record.key, record.value);
        }
        tracing::debug!(entries = state.entries.len(), "safebrowsing cache restored");
    }

    /// Look up a full hash, marking it as most recently used.
    pub async fn get(&self, full_hash: &str) -> Option<String> {
        self.state.lock().await.entries.get(full_hash).cloned()
    }

    /// Insert or replace an entry, flushing to storage on every
    /// [`SAVE_EVERY_WRITES`]th write.
    pub async fn set(&self, full_hash: impl Into<String>, value: impl Into<String>) {
        let records = {
            let mut state = self.state.lock().await;
            state.entries.put(full_hash.into(), value.into());
            state.writes += 1;
            (state.writes % SAVE_EVERY_WRITES == 0).then(|| state.records())
        };

        if let Some(records) = records {
            self.persist(&records).await;
        }
    }

    /// Remove every entry and persist the empty cache.
    pub async fn clear(&self) {
        self.state.lock().await.entries.clear();
        self.persist(&[]).await;
    }

    /// Write the current entries to storage.
    pub async fn save(&self) -> Result<(), Error> {
        let records = self.state.lock().await.records();
        self.write(&records).await
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn persist(&self, records: &[CacheRecord]) {
        if let Err(e) = self.write(records).await {
            tracing::warn!(error = %e, entries = records.len(), "failed to persist safebrowsing cache");
        }
    }

    async fn write(&self, records: &[CacheRecord]) -> Result<(), Error> {
        let json = serde_json::to_string(records)?;
        self.storage.set(SB_LRU_CACHE_KEY, &json).await
    }
}
