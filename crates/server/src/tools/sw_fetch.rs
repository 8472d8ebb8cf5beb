//! sw_fetch tool implementation.
//!
//! Dispatches a fetch signal. Requests the controller declines (non-GET,
//! cross-origin, or before activation) go straight to the network and are
//! never cached.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{
    CacheController, CacheStore, Error, Fetcher, Interception, Request, cache::key::canonicalize,
    controller::Revalidation,
};

use super::{ResponseView, json_result};

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to fetch, absolute or relative to the controller's scope.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Wait for the background refresh of a cache hit before returning.
    #[serde(default)]
    pub wait_for_revalidation: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    pub method: String,
    /// "cache", "network" or "passthrough".
    pub source: String,
    /// Background refresh state: "pending", "updated", "store_failed",
    /// "network_failed", or absent when no refresh was started.
    pub revalidation: Option<String>,
    pub response: ResponseView,
}

fn revalidation_label(outcome: Revalidation) -> &'static str {
    match outcome {
        Revalidation::Updated => "updated",
        Revalidation::StoreFailed => "store_failed",
        Revalidation::NetworkFailed => "network_failed",
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<S, F>(
    controller: &CacheController<S, F>, params: SwFetchParams,
) -> Result<CallToolResult, McpError>
where
    S: CacheStore + ?Sized + 'static,
    F: Fetcher + ?Sized + 'static,
{
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let url = canonicalize(&params.url, &controller.config().scope).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = Request::new(&params.method, url);
    let (resolved, method) = (request.url().to_string(), request.method().to_string());

    let output = match controller.handle_fetch(request).await? {
        Interception::Passthrough(request) => {
            tracing::debug!(method = request.method(), url = %request.url(), "not intercepted");
            let response = controller.fetcher().fetch(&request).await?;
            SwFetchOutput {
                url: resolved,
                method,
                source: "passthrough".into(),
                revalidation: None,
                response: ResponseView::from(&response),
            }
        }
        Interception::Respond(served) => {
            let revalidation = match served.revalidation {
                Some(handle) if params.wait_for_revalidation => {
                    let outcome = handle.await.unwrap_or(Revalidation::NetworkFailed);
                    Some(revalidation_label(outcome).to_string())
                }
                Some(_) => Some("pending".to_string()),
                None => None,
            };
            SwFetchOutput {
                url: resolved,
                method,
                source: served.source.as_str().to_string(),
                revalidation,
                response: ResponseView::from(&served.response),
            }
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{controller, text};

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams { url: url.into(), method: "GET".into(), wait_for_revalidation: true }
    }

    async fn fetch(controller: &crate::tools::testing::TestController, p: SwFetchParams) -> SwFetchOutput {
        let result = fetch_impl(controller, p).await.unwrap();
        serde_json::from_str(&text(&result)).unwrap()
    }

    #[tokio::test]
    async fn test_empty_url() {
        let (controller, _) = controller();
        let result = fetch_impl(&controller, params("  ")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_before_activation_passes_through() {
        let (controller, _) = controller();

        let output = fetch(&controller, params("./index.html")).await;

        assert_eq!(output.source, "passthrough");
        assert_eq!(output.response.body, "index");
        assert!(controller.store().generations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_then_offline() {
        let (controller, pages) = controller();
        controller.register().await.unwrap();
        pages.set("http://localhost:8080/index.html", "index v2");

        let first = fetch(&controller, params("./index.html")).await;
        assert_eq!(first.url, "http://localhost:8080/index.html");
        assert_eq!(first.source, "cache");
        assert_eq!(first.response.body, "index");
        assert_eq!(first.revalidation.as_deref(), Some("updated"));

        pages.clear();
        let second = fetch(&controller, params("./index.html")).await;
        assert_eq!(second.source, "cache");
        assert_eq!(second.response.body, "index v2");
        assert_eq!(second.revalidation.as_deref(), Some("network_failed"));
    }

    #[tokio::test]
    async fn test_miss_offline_is_network_error() {
        let (controller, pages) = controller();
        controller.register().await.unwrap();
        pages.clear();

        let err = fetch_impl(&controller, params("./js/main.js")).await.unwrap_err();
        assert_eq!(err.code.0, -32008);
    }

    #[tokio::test]
    async fn test_post_is_passthrough() {
        let (controller, pages) = controller();
        controller.register().await.unwrap();
        pages.set("http://localhost:8080/score", "saved");

        let output = fetch(
            &controller,
            SwFetchParams { url: "./score".into(), method: "post".into(), wait_for_revalidation: false },
        )
        .await;

        assert_eq!(output.source, "passthrough");
        assert_eq!(output.method, "POST");
        assert!(controller.store().match_any("http://localhost:8080/score").await.unwrap().is_none());
    }
}
