//! cache_purge tool implementation.
//!
//! Deletes one generation outright, outside the activation sweep.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheController, CacheStore, Fetcher};

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Name of the generation to delete.
    pub generation: String,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub generation: String,
    /// False when no such generation existed.
    pub deleted: bool,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl<S, F>(
    controller: &CacheController<S, F>, params: CachePurgeParams,
) -> Result<CallToolResult, McpError>
where
    S: CacheStore + ?Sized + 'static,
    F: Fetcher + ?Sized + 'static,
{
    let generation = params.generation.trim();
    if generation.is_empty() {
        return Err(ToolError::InvalidInput("generation cannot be empty".into()).into());
    }

    if generation == controller.config().version {
        tracing::warn!(generation, "purging the current generation; fetches fall back to the network");
    }

    let deleted = controller.store().delete(generation).await?;
    tracing::info!(generation, deleted, "cache purge");

    json_result(&CachePurgeOutput { generation: generation.to_string(), deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{controller, text};

    #[tokio::test]
    async fn test_purge_existing() {
        let (controller, _) = controller();
        controller.store().open("app-v2").await.unwrap();

        let params = CachePurgeParams { generation: "app-v2".to_string() };
        let result = purge_impl(&controller, params).await.unwrap();
        let output: CachePurgeOutput = serde_json::from_str(&text(&result)).unwrap();

        assert!(output.deleted);
        assert!(controller.store().generations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_missing() {
        let (controller, _) = controller();

        let params = CachePurgeParams { generation: "app-v1".to_string() };
        let result = purge_impl(&controller, params).await.unwrap();
        let output: CachePurgeOutput = serde_json::from_str(&text(&result)).unwrap();

        assert!(!output.deleted);
    }

    #[tokio::test]
    async fn test_purge_no_name() {
        let (controller, _) = controller();
        let params = CachePurgeParams { generation: "  ".to_string() };

        let err = purge_impl(&controller, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
