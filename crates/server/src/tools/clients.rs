//! sw_client tool implementation.
//!
//! Opens and closes client pages so activation has something to claim.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheController, CacheStore, Fetcher};

use super::json_result;
use crate::error::ToolError;

/// What to do with the client page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClientAction {
    Open,
    Close,
}

/// Parameters for the sw_client tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwClientParams {
    /// Client page identifier, e.g. a tab id.
    pub id: String,
    pub action: ClientAction,
}

/// Output from the sw_client tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwClientOutput {
    pub id: String,
    /// Whether the page was known before this call.
    pub existed: bool,
    /// Cache version controlling the page after this call.
    pub controller: Option<String>,
    pub open_clients: usize,
}

/// Implementation of the sw_client tool.
pub async fn client_impl<S, F>(
    controller: &CacheController<S, F>, params: SwClientParams,
) -> Result<CallToolResult, McpError>
where
    S: CacheStore + ?Sized + 'static,
    F: Fetcher + ?Sized + 'static,
{
    let id = params.id.trim();
    if id.is_empty() {
        return Err(ToolError::InvalidInput("client id cannot be empty".into()).into());
    }

    let clients = controller.clients();
    let existed = match params.action {
        ClientAction::Open => {
            let existed = clients.contains(id).await;
            controller.open_client(id).await;
            existed
        }
        ClientAction::Close => clients.close(id).await,
    };

    let output = SwClientOutput {
        id: id.to_string(),
        existed,
        controller: clients.controller_of(id).await,
        open_clients: clients.count().await,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{TestController, controller, text};

    async fn call(controller: &TestController, id: &str, action: ClientAction) -> SwClientOutput {
        let result = client_impl(controller, SwClientParams { id: id.into(), action }).await.unwrap();
        serde_json::from_str(&text(&result)).unwrap()
    }

    #[tokio::test]
    async fn test_open_before_activation_is_uncontrolled() {
        let (controller, _) = controller();

        let output = call(&controller, "tab-1", ClientAction::Open).await;
        assert!(!output.existed);
        assert!(output.controller.is_none());
        assert_eq!(output.open_clients, 1);
    }

    #[tokio::test]
    async fn test_activation_claims_open_clients() {
        let (controller, _) = controller();
        call(&controller, "tab-1", ClientAction::Open).await;

        controller.register().await.unwrap();

        let output = call(&controller, "tab-2", ClientAction::Open).await;
        assert_eq!(output.controller.as_deref(), Some("app-v3"));
        assert_eq!(controller.clients().controller_of("tab-1").await.as_deref(), Some("app-v3"));
        assert_eq!(output.open_clients, 2);
    }

    #[tokio::test]
    async fn test_close() {
        let (controller, _) = controller();
        call(&controller, "tab-1", ClientAction::Open).await;

        let output = call(&controller, "tab-1", ClientAction::Close).await;
        assert!(output.existed);
        assert_eq!(output.open_clients, 0);

        let again = call(&controller, "tab-1", ClientAction::Close).await;
        assert!(!again.existed);
    }

    #[tokio::test]
    async fn test_empty_id() {
        let (controller, _) = controller();
        let params = SwClientParams { id: " ".into(), action: ClientAction::Open };
        let err = client_impl(&controller, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
