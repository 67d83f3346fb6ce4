//! safebrowsing_set_disabled tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use sbguard_core::Settings;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the safebrowsing_set_disabled tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetDisabledParams {
    /// Turn safebrowsing checks off (true) or on (false).
    pub disabled: bool,
}

/// Output from the safebrowsing_set_disabled tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetDisabledOutput {
    pub disabled: bool,
    /// Whether the setting actually changed. A change also clears the result cache.
    pub changed: bool,
}

/// Implementation of the safebrowsing_set_disabled tool.
pub async fn set_disabled_impl(settings: &Settings, params: SetDisabledParams) -> Result<CallToolResult, McpError> {
    let changed = settings.is_safebrowsing_disabled() != params.disabled;
    settings.set_safebrowsing_disabled(params.disabled);

    tracing::info!(disabled = params.disabled, changed, "safebrowsing setting updated");
    json_result(&SetDisabledOutput { disabled: params.disabled, changed })
}
