//! cache_get tool implementation.
//!
//! Retrieves a stored response by URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::cache::key::{canonicalize, request_key};
use swcache_core::{CacheController, CacheStore, Error, Fetcher};

use crate::tools::{ResponseView, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL of the entry, absolute or relative to the scope.
    pub url: String,

    /// Generation to read from. When omitted, the current generation is
    /// read first and then every other one oldest first, the same lookup the
    /// fetch path uses.
    pub generation: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub key: String,
    pub response: ResponseView,
}

/// Implementation of the cache_get tool.
pub async fn get_impl<S, F>(
    controller: &CacheController<S, F>, params: CacheGetParams,
) -> Result<CallToolResult, McpError>
where
    S: CacheStore + ?Sized + 'static,
    F: Fetcher + ?Sized + 'static,
{
    let url = canonicalize(&params.url, &controller.config().scope).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let key = request_key(&url);

    let found = match params.generation.as_deref().map(str::trim) {
        Some(generation) if !generation.is_empty() => controller.store().lookup(generation, &key).await?,
        _ => controller.cached(&key).await?,
    };
    let response = found.ok_or_else(|| Error::CacheMiss(key.clone()))?;

    json_result(&CacheGetOutput { key, response: ResponseView::from(&response) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{controller, text};

    #[tokio::test]
    async fn test_get_impl_missing() {
        let (controller, _) = controller();
        let params = CacheGetParams { url: "./nope.html".to_string(), generation: None };

        let err = get_impl(&controller, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let (controller, _) = controller();
        controller.register().await.unwrap();

        let params = CacheGetParams { url: "index.html#top".to_string(), generation: Some("app-v3".into()) };
        let result = get_impl(&controller, params).await.unwrap();
        let output: CacheGetOutput = serde_json::from_str(&text(&result)).unwrap();

        assert_eq!(output.key, "http://localhost:8080/index.html");
        assert_eq!(output.response.body, "index");
        assert!(output.response.stored_at.is_some());
    }

    #[tokio::test]
    async fn test_get_impl_wrong_generation() {
        let (controller, _) = controller();
        controller.register().await.unwrap();

        let params = CacheGetParams { url: "./".to_string(), generation: Some("app-v2".into()) };
        assert!(get_impl(&controller, params).await.is_err());
    }
}
