//! sw_install, sw_activate and sw_status tool implementations.
//!
//! These dispatch the controller's lifecycle signals the way a browser
//! runtime would after registering a service worker.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheController, CacheStore, Fetcher, LifecycleState, controller::ActivateReport};

use super::json_result;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    /// Generation the manifest was written to.
    pub generation: String,
    /// Cache keys written, in manifest order.
    pub cached: Vec<String>,
    /// Activation that followed because of skip-waiting, if any.
    pub activation: Option<ActivateOutput>,
    pub state: LifecycleState,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    pub generation: String,
    /// Stale generations that were deleted.
    pub deleted: Vec<String>,
    /// Open clients taken over by this activation.
    pub claimed_clients: usize,
}

impl From<ActivateReport> for ActivateOutput {
    fn from(report: ActivateReport) -> Self {
        Self { generation: report.generation, deleted: report.deleted, claimed_clients: report.claimed }
    }
}

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusOutput {
    pub state: LifecycleState,
    pub version: String,
    pub scope: String,
    pub manifest: Vec<String>,
    pub skip_waiting: bool,
    /// Every generation present in the store, oldest first.
    pub generations: Vec<String>,
    pub controlled_clients: usize,
}

/// Implementation of the sw_install tool.
pub async fn install_impl<S, F>(controller: &CacheController<S, F>) -> Result<CallToolResult, McpError>
where
    S: CacheStore + ?Sized + 'static,
    F: Fetcher + ?Sized + 'static,
{
    let (installed, activated) = controller.register().await?;

    let output = InstallOutput {
        generation: installed.generation,
        cached: installed.cached,
        activation: activated.map(ActivateOutput::from),
        state: controller.state().await,
    };
    json_result(&output)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl<S, F>(controller: &CacheController<S, F>) -> Result<CallToolResult, McpError>
where
    S: CacheStore + ?Sized + 'static,
    F: Fetcher + ?Sized + 'static,
{
    let report = controller.activate().await?;
    json_result(&ActivateOutput::from(report))
}

/// Implementation of the sw_status tool.
pub async fn status_impl<S, F>(controller: &CacheController<S, F>) -> Result<CallToolResult, McpError>
where
    S: CacheStore + ?Sized + 'static,
    F: Fetcher + ?Sized + 'static,
{
    let config = controller.config();
    let output = StatusOutput {
        state: controller.state().await,
        version: config.version.clone(),
        scope: config.scope.to_string(),
        manifest: config.manifest.urls().iter().map(|u| u.to_string()).collect(),
        skip_waiting: config.skip_waiting,
        generations: controller.store().generations().await?,
        controlled_clients: controller.clients().controlled_by(&config.version).await,
    };
    json_result(&output)
}
