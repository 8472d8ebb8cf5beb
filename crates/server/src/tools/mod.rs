//! MCP tool implementations.
//!
//! This module contains all tools exposed by the swcache server. Each tool
//! maps to one lifecycle signal or one cache inspection.

pub mod cache;
pub mod clients;
pub mod lifecycle;
pub mod sw_fetch;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::CachedResponse;

use crate::error::ToolError;

/// Serialize a tool output as pretty JSON text content.
pub fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// A stored or served response as the tools report it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseView {
    /// URL the response came from.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Header pairs, lowercase names.
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
    /// Hex SHA-256 of the body bytes.
    pub body_sha256: String,
    /// When the entry was written to the cache, if it was.
    pub stored_at: Option<String>,
}

impl From<&CachedResponse> for ResponseView {
    fn from(response: &CachedResponse) -> Self {
        Self {
            url: response.url.clone(),
            status: response.status,
            content_type: response.content_type().map(str::to_string),
            headers: response.headers.clone(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_bytes: response.body.len(),
            body_sha256: response.body_sha256(),
            stored_at: response.stored_at.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use swcache_core::{
        CacheController, CachedResponse, ControllerConfig, Error, Fetcher, MemoryStore, Request,
        controller::PrecacheManifest,
    };
    use url::Url;

    pub const SCOPE: &str = "http://localhost:8080/";

    /// Serves fixed pages; anything else is a network failure.
    #[derive(Default)]
    pub struct Pages {
        pub bodies: Mutex<HashMap<String, String>>,
    }

    impl Pages {
        pub fn set(&self, url: &str, body: &str) {
            self.bodies.lock().unwrap().insert(url.to_string(), body.to_string());
        }

        pub fn clear(&self) {
            self.bodies.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl Fetcher for Pages {
        async fn fetch(&self, request: &Request) -> Result<CachedResponse, Error> {
            let body = self.bodies.lock().unwrap().get(request.url().as_str()).cloned();
            body.map(|b| CachedResponse::new(request.url().as_str(), 200, vec![], b))
                .ok_or_else(|| Error::Network(format!("unreachable: {}", request.url())))
        }
    }

    pub type TestController = CacheController<MemoryStore, Pages>;

    /// Controller over a memory store whose manifest is `./` and `./index.html`.
    pub fn controller() -> (TestController, Arc<Pages>) {
        let pages = Arc::new(Pages::default());
        pages.set("http://localhost:8080/", "root");
        pages.set("http://localhost:8080/index.html", "index");

        let scope = Url::parse(SCOPE).unwrap();
        let manifest = PrecacheManifest::resolve(["./", "./index.html"], &scope).unwrap();
        let config = ControllerConfig::new(scope, "app-v3").with_manifest(manifest);
        (CacheController::new(config, Arc::new(MemoryStore::new()), pages.clone()), pages)
    }

    /// Text of the first content block of a tool result.
    pub fn text(result: &rmcp::model::CallToolResult) -> String {
        let value = serde_json::to_value(&result.content[0]).unwrap();
        value
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content")
            .to_string()
    }
}
