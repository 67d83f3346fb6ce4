//! safebrowsing_trust tool implementation.
//!
//! Marks a URL's host as trusted so later checks never divert it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use sbguard_client::{SafebrowsingService, host_of};
use sbguard_core::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the safebrowsing_trust tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SafebrowsingTrustParams {
    /// A URL on the host to trust.
    pub url: String,
}

/// Output from the safebrowsing_trust tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SafebrowsingTrustOutput {
    /// The host that is now trusted.
    pub host: String,
}

/// Implementation of the safebrowsing_trust tool.
pub async fn trust_impl(
    service: &SafebrowsingService, params: SafebrowsingTrustParams,
) -> Result<CallToolResult, McpError> {
    let host = host_of(&params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    service.add_to_safebrowsing_trusted(&params.url).await?;

    tracing::info!(host, "host trusted by user");
    json_result(&SafebrowsingTrustOutput { host })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::check::{SafebrowsingCheckParams, check_impl};
    use crate::tools::testing::{FixedLookup, output_json, service};
    use sbguard_client::RequestType;
    use sbguard_core::hash::create_hash;

    #[tokio::test]
    async fn test_trusted_host_is_not_blocked() {
        let body = format!("adguard-malware-shavar:35176:{}", create_hash("bad.example"));
        let lookup = FixedLookup::new(200, body);
        let (service, settings) = service(lookup.clone()).await;

        let result = trust_impl(&service, SafebrowsingTrustParams { url: "https://BAD.example/x".into() })
            .await
            .unwrap();
        assert_eq!(output_json(&result)["host"], "bad.example");

        let params = SafebrowsingCheckParams {
            url: "https://bad.example/download".into(),
            referrer: String::new(),
            request_type: RequestType::Document,
            status_code: None,
        };
        let output = output_json(&check_impl(&service, &settings, params).await.unwrap());

        assert_eq!(output["blocked"], false);
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_trust_invalid_url() {
        let (service, _) = service(FixedLookup::new(204, "")).await;

        let err = trust_impl(&service, SafebrowsingTrustParams { url: "ftp://files.example".into() })
            .await
            .unwrap_err();

        assert_eq!(err.code.0, -32003);
    }
}
