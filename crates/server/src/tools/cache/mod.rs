//! Result cache management tools.

pub mod clear;

pub use clear::{CacheClearOutput, clear_impl};
