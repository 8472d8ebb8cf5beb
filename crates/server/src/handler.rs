//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    cache::{CacheGetParams, CacheKeysParams, CachePurgeParams, get_impl, keys_impl, purge_impl},
    clients::{SwClientParams, client_impl},
    lifecycle::{activate_impl, install_impl, status_impl},
    sw_fetch::{SwFetchParams, fetch_impl},
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
use swcache_client::FetchClient;
use swcache_core::{CacheController, CacheDb};

/// Controller backed by the SQLite store and the HTTP fetcher.
pub type Controller = CacheController<CacheDb, FetchClient>;

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    tool_router: ToolRouter<Self>,
    controller: Arc<Controller>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler around a shared controller.
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { tool_router: Self::tool_router(), controller }
    }

    /// Dispatch the install signal.
    ///
    /// Precaches the manifest into the current generation. With skip-waiting
    /// enabled the controller activates straight after.
    #[tool(description = "Install the cache controller: fetch and store every precache URL. Fails if any fetch fails.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(self.controller.as_ref()).await
    }

    #[tool(description = "Activate an installed controller: delete stale cache generations and claim open clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(self.controller.as_ref()).await
    }

    #[tool(description = "Report lifecycle state, cache version, scope, generations and controlled clients.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(self.controller.as_ref()).await
    }

    /// Dispatch a fetch signal.
    ///
    /// Cache hits are answered immediately while the network refreshes the
    /// entry in the background.
    #[tool(
        description = "Fetch a URL through the controller. Same-origin GETs are served cache-first and revalidated; other requests go to the network."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(self.controller.as_ref(), params.0).await
    }

    #[tool(description = "Open or close a client page. Pages opened after activation are controlled immediately.")]
    async fn sw_client(&self, params: Parameters<SwClientParams>) -> Result<CallToolResult, McpError> {
        client_impl(self.controller.as_ref(), params.0).await
    }

    #[tool(description = "List cache generations, or the keys stored in one generation.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(self.controller.as_ref(), params.0).await
    }

    #[tool(description = "Read a stored response by URL. Reads the current generation first, then older ones, unless one is named.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(self.controller.as_ref(), params.0).await
    }

    #[tool(description = "Delete one cache generation and all its entries.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(self.controller.as_ref(), params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
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
