//! Safebrowsing lookup state.
//!
//! Two cache tiers with different persistence contracts, plus the suspend window:
//!
//! - [`ResultCache`]: persistent LRU of full host hash to list name, restored at
//!   startup and flushed to storage every 20th write
//! - [`RequestCache`]: session-only LRU of short hashes already queried
//! - [`SuspendState`]: persisted timestamp that gates backend calls after a failure

pub mod request;
pub mod result;
pub mod suspend;

pub use crate::Error;

pub use request::RequestCache;
pub use result::{ALLOW_SENTINEL, CacheRecord, ResultCache};
pub use suspend::{SUSPEND_TTL_MS, SuspendState};
