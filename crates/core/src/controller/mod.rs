//! Offline resource cache controller.
//!
//! Owns one cache store and one network fetcher and reacts to the three
//! lifecycle signals a hosting runtime dispatches:
//!
//! - `install`: fetch the whole precache manifest, then write it into the
//!   generation named by the version label. Any failed fetch aborts the
//!   install and writes nothing.
//! - `activate`: delete every generation outside the retained set, then
//!   claim all open clients.
//! - `fetch`: see [`fetch`] for the interception rules.
//!
//! State moves `parsed → installing → installed → activating → activated`.

pub mod clients;
pub mod fetch;
pub mod lifecycle;
pub mod manifest;

use std::sync::Arc;

use futures_util::future::try_join_all;
use tokio::sync::RwLock;
use url::Url;

use crate::Error;
use crate::cache::CacheStore;
use crate::config::AppConfig;
use crate::request::{CachedResponse, Request};

pub use clients::ClientRegistry;
pub use fetch::{Fetcher, ResponseSource, Revalidation, Served, should_intercept, stale_while_revalidate};
pub use lifecycle::LifecycleState;
pub use manifest::PrecacheManifest;

/// Static settings of one controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub scope: Url,
    pub version: String,
    pub manifest: PrecacheManifest,
    /// Generations that survive activation; always includes `version`.
    pub retained: Vec<String>,
    pub skip_waiting: bool,
}

impl ControllerConfig {
    /// A controller for `scope` with an empty manifest.
    pub fn new(scope: Url, version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            scope,
            retained: vec![version.clone()],
            version,
            manifest: PrecacheManifest::default(),
            skip_waiting: true,
        }
    }

    pub fn with_manifest(mut self, manifest: PrecacheManifest) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn with_skip_waiting(mut self, skip_waiting: bool) -> Self {
        self.skip_waiting = skip_waiting;
        self
    }

    /// Keep `name` at activation in addition to the current version.
    pub fn retain(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.retained.contains(&name) {
            self.retained.push(name);
        }
        self
    }

    /// Build from loaded application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let scope = Url::parse(config.scope.trim()).map_err(|e| Error::InvalidUrl(format!("scope: {e}")))?;
        let manifest = PrecacheManifest::resolve(&config.precache, &scope)?;
        Ok(Self {
            scope,
            version: config.cache_version.clone(),
            manifest,
            retained: config.retained(),
            skip_waiting: config.skip_waiting,
        })
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub generation: String,
    /// Keys written, in manifest order.
    pub cached: Vec<String>,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    pub generation: String,
    /// Generations removed, oldest first.
    pub deleted: Vec<String>,
    /// Clients that were taken over.
    pub claimed: usize,
}

/// What the controller did with a fetch signal.
#[derive(Debug)]
pub enum Interception {
    /// Not handled; the caller performs the request itself, unmodified.
    Passthrough(Request),
    Respond(Served),
}

/// The cache controller.
pub struct CacheController<S: ?Sized, F: ?Sized> {
    config: ControllerConfig,
    store: Arc<S>,
    fetcher: Arc<F>,
    state: RwLock<LifecycleState>,
    clients: ClientRegistry,
}

impl<S, F> CacheController<S, F>
where
    S: CacheStore + ?Sized + 'static,
    F: Fetcher + ?Sized + 'static,
{
    pub fn new(config: ControllerConfig, store: Arc<S>, fetcher: Arc<F>) -> Self {
        Self { config, store, fetcher, state: RwLock::new(LifecycleState::Parsed), clients: ClientRegistry::new() }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Handle the install signal.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` unless the controller is `parsed`
    /// - `Error::InstallFailed` if any manifest URL fails to fetch or answers
    ///   with a non-2xx status; the controller returns to `parsed`
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(&[LifecycleState::Parsed], LifecycleState::Installing, "install")
            .await?;
        tracing::info!(version = %self.config.version, entries = self.config.manifest.len(), "installing");

        match self.precache().await {
            Ok(report) => {
                self.set_state(LifecycleState::Installed).await;
                tracing::info!(version = %report.generation, cached = report.cached.len(), "installed");
                Ok(report)
            }
            Err(e) => {
                self.set_state(LifecycleState::Parsed).await;
                tracing::warn!(version = %self.config.version, error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<InstallReport, Error> {
        let fetches = self.config.manifest.urls().iter().map(|url| {
            let fetcher = Arc::clone(&self.fetcher);
            let request = Request::get(url.clone());
            async move {
                let response = fetcher.fetch(&request).await.map_err(|e| Error::InstallFailed {
                    url: request.url().to_string(),
                    reason: e.to_string(),
                })?;
                if !response.is_ok() {
                    return Err(Error::InstallFailed {
                        url: request.url().to_string(),
                        reason: format!("status {}", response.status),
                    });
                }
                Ok::<_, Error>((request.cache_key(), response))
            }
        });
        let entries = try_join_all(fetches).await?;

        let generation = self.config.version.clone();
        self.store.open(&generation).await?;
        self.store.put_all(&generation, &entries).await?;

        let cached = entries.into_iter().map(|(key, _)| key).collect();
        Ok(InstallReport { generation, cached })
    }

    /// Handle the activate signal.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` unless the controller is `installed`
    /// - store errors while deleting; the controller returns to `installed`
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.transition(&[LifecycleState::Installed], LifecycleState::Activating, "activate")
            .await?;

        let deleted = match self.purge_stale().await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.set_state(LifecycleState::Installed).await;
                tracing::warn!(version = %self.config.version, error = %e, "activation failed");
                return Err(e);
            }
        };

        let claimed = self.clients.claim(&self.config.version).await;
        self.set_state(LifecycleState::Activated).await;
        tracing::info!(version = %self.config.version, deleted = deleted.len(), claimed, "activated");

        Ok(ActivateReport { generation: self.config.version.clone(), deleted, claimed })
    }

    async fn purge_stale(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.store.generations().await? {
            if self.config.retained.contains(&name) {
                continue;
            }
            if self.store.delete(&name).await? {
                tracing::debug!(generation = %name, "deleted stale generation");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Install, then activate straight away when `skip_waiting` is set.
    pub async fn register(&self) -> Result<(InstallReport, Option<ActivateReport>), Error> {
        let installed = self.install().await?;
        if !self.config.skip_waiting {
            tracing::info!(version = %self.config.version, "waiting for activation");
            return Ok((installed, None));
        }
        let activated = self.activate().await?;
        Ok((installed, Some(activated)))
    }

    /// Handle a fetch signal.
    ///
    /// Requests are only answered once the controller is activated, and then
    /// only same-origin GETs.
    pub async fn handle_fetch(&self, request: Request) -> Result<Interception, Error> {
        if !self.state().await.controls_fetches() || !should_intercept(&request, &self.config.scope) {
            return Ok(Interception::Passthrough(request));
        }
        let served = stale_while_revalidate(
            request,
            &self.config.version,
            Arc::clone(&self.store),
            Arc::clone(&self.fetcher),
        )
        .await?;
        Ok(Interception::Respond(served))
    }

    /// Stored entry for `key` as the fetch path would find it: the current
    /// generation first, then the oldest generation holding it.
    pub async fn cached(&self, key: &str) -> Result<Option<CachedResponse>, Error> {
        fetch::lookup(self.store.as_ref(), &self.config.version, key).await
    }

    /// Record a newly opened client page.
    ///
    /// Pages opened after activation are controlled immediately. Returns
    /// whether the page is controlled.
    pub async fn open_client(&self, id: &str) -> bool {
        let controlled = self.state().await.controls_fetches();
        let version = controlled.then_some(self.config.version.as_str());
        self.clients.open(id, version).await;
        controlled
    }

    async fn transition(&self, from: &[LifecycleState], to: LifecycleState, signal: &str) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if !from.contains(&*state) {
            return Err(Error::InvalidState(format!("cannot {signal} while {}", *state)));
        }
        *state = to;
        Ok(())
    }

    async fn set_state(&self, to: LifecycleState) {
        *self.state.write().await = to;
    }
}
