//! Key-value storage for the safebrowsing state.
//!
//! The lookup subsystem persists two string-serialized records:
//!
//! - [`SB_LRU_CACHE_KEY`]: the result cache entries as a JSON array
//! - [`SB_SUSPENDED_CACHE_KEY`]: the suspend timestamp as a JSON number
//!
//! Values are opaque to the storage; callers serialize them before writing.

pub mod connection;
pub mod kv;
pub mod migrations;

pub use crate::Error;

pub use connection::StorageDb;

/// Storage key of the persisted result cache.
pub const SB_LRU_CACHE_KEY: &str = "sb-lru-cache";

/// Storage key of the suspend timestamp.
pub const SB_SUSPENDED_CACHE_KEY: &str = "safebrowsing-suspended-from";

/// Asynchronous string key-value store.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Delete `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), Error>;
}
