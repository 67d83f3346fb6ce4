//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    SafebrowsingCheckParams, SafebrowsingTrustParams, SetDisabledParams, check_impl, clear_impl, set_disabled_impl,
    trust_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use sbguard_client::SafebrowsingService;
use sbguard_core::Settings;
use std::sync::Arc;

/// The main MCP server handler for sbguard.
#[derive(Clone)]
pub struct SbGuardServer {
    service: Arc<SafebrowsingService>,
    settings: Arc<Settings>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SbGuardServer {
    /// Create a new server handler around an initialized service.
    pub fn new(service: Arc<SafebrowsingService>, settings: Arc<Settings>) -> Self {
        Self { service, settings, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Check a navigation against the safebrowsing lists. Returns whether it is blocked and the warning page URL it would be diverted to."
    )]
    async fn safebrowsing_check(&self, params: Parameters<SafebrowsingCheckParams>) -> Result<CallToolResult, McpError> {
        check_impl(&self.service, &self.settings, params.0).await
    }

    #[tool(description = "Trust the host of a URL so it is never diverted to the safebrowsing warning page.")]
    async fn safebrowsing_trust(&self, params: Parameters<SafebrowsingTrustParams>) -> Result<CallToolResult, McpError> {
        trust_impl(&self.service, params.0).await
    }

    #[tool(description = "Drop every cached safebrowsing verdict, including trusted hosts.")]
    async fn safebrowsing_clear_cache(&self) -> Result<CallToolResult, McpError> {
        clear_impl(&self.service).await
    }

    /// Toggle safebrowsing checks.
    ///
    /// Any change clears the result cache.
    #[tool(description = "Turn safebrowsing checks off or on. Changing the setting clears the verdict cache.")]
    async fn safebrowsing_set_disabled(&self, params: Parameters<SetDisabledParams>) -> Result<CallToolResult, McpError> {
        set_disabled_impl(&self.settings, params.0).await
    }
}

impl ServerHandler for SbGuardServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "sbguard".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
