//! cache_keys tool implementation.
//!
//! Lists generations, or the keys held by one of them.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheController, CacheStore, Fetcher};

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Generation to list. When omitted, every generation is listed.
    pub generation: Option<String>,
}

/// Keys held by a single generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationKeys {
    pub name: String,
    /// True for the generation the controller writes to.
    pub current: bool,
    pub keys: Vec<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub generations: Vec<GenerationKeys>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl<S, F>(
    controller: &CacheController<S, F>, params: CacheKeysParams,
) -> Result<CallToolResult, McpError>
where
    S: CacheStore + ?Sized + 'static,
    F: Fetcher + ?Sized + 'static,
{
    let store = controller.store();
    let names = match params.generation.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            if store.generations().await?.iter().any(|g| g == name) { vec![name.to_string()] } else { vec![] }
        }
        _ => store.generations().await?,
    };

    let mut generations = Vec::with_capacity(names.len());
    for name in names {
        let keys = store.keys(&name).await?;
        let current = name == controller.config().version;
        generations.push(GenerationKeys { name, current, keys });
    }

    json_result(&CacheKeysOutput { generations })
}
