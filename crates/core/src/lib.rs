//! Core types and shared functionality for sbguard.
//!
//! This crate provides:
//! - Host decomposition and SHA-256 host hashing
//! - The persistent result cache, the session request cache and suspend state
//! - Key-value storage with a SQLite backend
//! - Unified error types
//! - Configuration and runtime settings

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod hash;
pub mod hosts;
pub mod settings;
pub mod storage;

pub use cache::{ALLOW_SENTINEL, RequestCache, ResultCache, SuspendState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Error;
pub use settings::{SettingChange, SettingOption, Settings};
pub use storage::{Storage, StorageDb};
