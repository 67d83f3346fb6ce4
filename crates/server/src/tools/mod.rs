//! MCP tool implementations.
//!
//! This module contains all tools exposed by the sbguard server.

pub mod cache;
pub mod check;
pub mod settings;
pub mod trust;

pub use cache::{CacheClearOutput, clear_impl};
pub use check::{SafebrowsingCheckOutput, SafebrowsingCheckParams, check_impl};
pub use settings::{SetDisabledOutput, SetDisabledParams, set_disabled_impl};
pub use trust::{SafebrowsingTrustOutput, SafebrowsingTrustParams, trust_impl};

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use sbguard_core::Error;
use serde::Serialize;

/// Serialize a tool output into a pretty JSON text result.
fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::Serialization(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
