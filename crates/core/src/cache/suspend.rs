//! Backend suspend window.
//!
//! After a transport failure or a 5xx response the service records the time
//! and skips every backend call until [`SUSPEND_TTL_MS`] has elapsed. The
//! timestamp is mirrored to storage under [`SB_SUSPENDED_CACHE_KEY`] so the
//! window survives restarts.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::{SB_SUSPENDED_CACHE_KEY, Storage};

/// Suspend window after a backend error: 40 minutes.
pub const SUSPEND_TTL_MS: i64 = 40 * 60 * 1000;

pub struct SuspendState {
    suspended_from: Mutex<Option<i64>>,
    storage: Arc<dyn Storage>,
}

impl SuspendState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { suspended_from: Mutex::new(None), storage }
    }

    /// Restore the timestamp from storage. Unreadable values count as not suspended.
    pub async fn init(&self) {
        let stored = match self.storage.get(SB_SUSPENDED_CACHE_KEY).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read safebrowsing suspend state");
                None
            }
        };

        let suspended_from = stored.and_then(|value| match serde_json::from_str::<i64>(&value) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::warn!(error = %e, value = %value, "ignoring invalid safebrowsing suspend timestamp");
                None
            }
        });

        *self.suspended_from.lock().await = suspended_from;
    }

    pub async fn suspended_from(&self) -> Option<i64> {
        *self.suspended_from.lock().await
    }

    /// Whether backend calls are gated at `now_ms`.
    pub async fn is_suspended(&self, now_ms: i64) -> bool {
        match self.suspended_from().await {
            Some(from) if from > 0 => now_ms - from < SUSPEND_TTL_MS,
            _ => false,
        }
    }

    /// Start a suspend window at `now_ms`.
    pub async fn suspend(&self, now_ms: i64) {
        *self.suspended_from.lock().await = Some(now_ms);

        if let Err(e) = self.storage.set(SB_SUSPENDED_CACHE_KEY, &now_ms.to_string()).await {
            tracing::warn!(error = %e, "failed to persist safebrowsing suspend state");
        }
    }

    /// End any suspend window.
    pub async fn resume(&self) {
        if self.suspended_from.lock().await.take().is_none() {
            return;
        }

        if let Err(e) = self.storage.remove(SB_SUSPENDED_CACHE_KEY).await {
            tracing::warn!(error = %e, "failed to clear safebrowsing suspend state");
        }
    }
}
