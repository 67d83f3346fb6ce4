//! safebrowsing_check tool implementation.
//!
//! Runs a navigation through the safebrowsing filter and reports whether it
//! would be diverted to the warning page.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use sbguard_client::{HeadersReceived, RequestType, SafebrowsingService, should_check};
use sbguard_core::{Error, Settings};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the safebrowsing_check tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SafebrowsingCheckParams {
    /// The URL being navigated to.
    pub url: String,

    /// The referrer of the navigation, passed through to the warning page.
    #[serde(default)]
    pub referrer: String,

    /// Request type reported by the filtering engine. Only "document" requests are checked.
    #[serde(default)]
    pub request_type: RequestType,

    /// HTTP status of the response (default 200). Redirects (301, 302) are not checked.
    #[serde(default)]
    pub status_code: Option<u16>,
}

/// Output structure for the safebrowsing_check tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SafebrowsingCheckOutput {
    pub url: String,
    /// Whether the request went through the lookup at all.
    pub checked: bool,
    /// Whether the navigation would be diverted.
    pub blocked: bool,
    /// Warning page the navigation is diverted to.
    pub redirect_url: Option<String>,
}

/// Implementation of the safebrowsing_check tool.
pub async fn check_impl(
    service: &SafebrowsingService, settings: &Settings, params: SafebrowsingCheckParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let details = HeadersReceived {
        request_type: params.request_type,
        status_code: params.status_code.unwrap_or(200),
        request_url: params.url,
        referrer_url: params.referrer,
    };

    let checked = should_check(details.request_type, details.status_code) && !settings.is_safebrowsing_disabled();
    let redirect_url = if checked { service.on_headers_received(&details).await } else { None };

    let output = SafebrowsingCheckOutput {
        url: details.request_url,
        checked,
        blocked: redirect_url.is_some(),
        redirect_url,
    };

    json_result(&output)
}
