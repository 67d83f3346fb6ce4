//! safebrowsing_clear_cache tool implementation.
//!
//! Drops every cached verdict, including trusted hosts.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use sbguard_client::SafebrowsingService;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the safebrowsing_clear_cache tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    /// Number of cached verdicts that were dropped.
    pub cleared: usize,
}

/// Implementation of the safebrowsing_clear_cache tool.
pub async fn clear_impl(service: &SafebrowsingService) -> Result<CallToolResult, McpError> {
    let cleared = service.result_cache().len().await;
    service.clear_cache().await;

    json_result(&CacheClearOutput { cleared })
}
