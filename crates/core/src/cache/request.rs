//! Session-only cache of short hashes already sent to the backend.
//!
//! Never persisted: it only avoids repeating a backend round-trip for the
//! same prefix within the lifetime of the process.

use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

/// Default number of short hashes remembered.
pub const REQUEST_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

pub struct RequestCache {
    seen: Mutex<LruCache<String, ()>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::with_capacity(REQUEST_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self { seen: Mutex::new(LruCache::new(capacity)) }
    }

    /// Whether `short_hash` was already queried, marking it as recently used.
    pub async fn contains(&self, short_hash: &str) -> bool {
        self.seen.lock().await.get(short_hash).is_some()
    }

    /// Keep only the short hashes that have not been queried yet, in order.
    pub async fn unseen(&self, short_hashes: Vec<String>) -> Vec<String> {
        let mut seen = self.seen.lock().await;
        short_hashes
            .into_iter()
            .filter(|hash| seen.get(hash.as_str()).is_none())
            .collect()
    }

    pub async fn mark_seen<I>(&self, short_hashes: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = self.seen.lock().await;
        for hash in short_hashes {
            seen.put(hash, ());
        }
    }

    pub async fn len(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new()
    }
}
