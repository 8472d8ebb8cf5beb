//! Fetch interception: stale-while-revalidate over a cache store.
//!
//! ### Interception rules
//! - Non-GET requests pass through untouched.
//! - Cross-origin requests pass through untouched.
//!
//! ### Serving
//! - The network request is issued as soon as interception starts,
//!   concurrently with the cache lookup.
//! - Cache hit: the cached response is returned at once; the network result
//!   refreshes the entry in a background task.
//! - Cache miss: the caller waits for the network. A network failure is
//!   surfaced as the fetch's error.
//! - Every network response (any status) overwrites the entry for its key in
//!   the current generation. Writes are best-effort.
//! - Lookups prefer the current generation, so a refresh is visible on the
//!   next read even when a retained generation holds the same key.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use url::Url;

use crate::Error;
use crate::cache::CacheStore;
use crate::cache::key::is_same_origin;
use crate::request::{CachedResponse, Request};

/// The network side of the controller.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request. `Err` means no response was produced at all;
    /// HTTP error statuses are still `Ok`.
    async fn fetch(&self, request: &Request) -> Result<CachedResponse, Error>;
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

impl ResponseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
        }
    }
}

/// Outcome of a background refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revalidation {
    /// Network answered and the entry was overwritten.
    Updated,
    /// Network answered but the cache write failed.
    StoreFailed,
    /// Network failed; the cached entry is left as it was.
    NetworkFailed,
}

/// A response handed back to the caller of an intercepted fetch.
#[derive(Debug)]
pub struct Served {
    pub response: CachedResponse,
    pub source: ResponseSource,
    /// Background refresh, present when the response came from cache.
    /// Dropping the handle detaches the task; it still runs to completion.
    pub revalidation: Option<JoinHandle<Revalidation>>,
}

/// Whether the controller should answer `request` at all.
pub fn should_intercept(request: &Request, origin: &Url) -> bool {
    request.is_read() && is_same_origin(request.url(), origin)
}

/// Serve `request` from `store`, refreshing it from `fetcher`.
///
/// Writes go to `generation`. Lookups read `generation` first and fall back
/// to every other generation in the store, oldest first.
/// Callers are expected to have checked [`should_intercept`].
///
/// # Errors
///
/// Returns the network error when there is no cached entry and the network
/// fails.
pub async fn stale_while_revalidate<S, F>(
    request: Request, generation: &str, store: Arc<S>, fetcher: Arc<F>,
) -> Result<Served, Error>
where
    S: CacheStore + ?Sized + 'static,
    F: Fetcher + ?Sized + 'static,
{
    let key = request.cache_key();

    let network = {
        let fetcher = Arc::clone(&fetcher);
        let request = request.clone();
        tokio::spawn(async move { fetcher.fetch(&request).await })
    };

    let cached = match lookup(store.as_ref(), generation, &key).await {
        Ok(cached) => cached,
        Err(e) => {
            tracing::warn!(%key, error = %e, "cache lookup failed; treating as miss");
            None
        }
    };

    match cached {
        Some(response) => {
            tracing::debug!(%key, "cache hit; revalidating in background");
            let generation = generation.to_string();
            let revalidation = tokio::spawn(async move {
                match settle(network, store.as_ref(), &generation, &key).await {
                    Ok((_, true)) => Revalidation::Updated,
                    Ok((_, false)) => Revalidation::StoreFailed,
                    Err(e) if e.is_network() => {
                        tracing::debug!(%key, error = %e, "revalidation failed; keeping cached entry");
                        Revalidation::NetworkFailed
                    }
                    Err(e) => {
                        tracing::warn!(%key, error = %e, "revalidation failed; keeping cached entry");
                        Revalidation::NetworkFailed
                    }
                }
            });
            Ok(Served { response, source: ResponseSource::Cache, revalidation: Some(revalidation) })
        }
        None => {
            tracing::debug!(%key, "cache miss; waiting for network");
            let (response, _) = settle(network, store.as_ref(), generation, &key).await?;
            Ok(Served { response, source: ResponseSource::Network, revalidation: None })
        }
    }
}

/// The current generation's entry, else the oldest generation holding `key`.
pub(crate) async fn lookup<S>(store: &S, generation: &str, key: &str) -> Result<Option<CachedResponse>, Error>
where
    S: CacheStore + ?Sized,
{
    match store.lookup(generation, key).await? {
        Some(response) => Ok(Some(response)),
        None => store.match_any(key).await,
    }
}

/// Wait for the network and write its response to the cache.
///
/// Returns the response and whether the write succeeded.
async fn settle<S>(
    network: JoinHandle<Result<CachedResponse, Error>>, store: &S, generation: &str, key: &str,
) -> Result<(CachedResponse, bool), Error>
where
    S: CacheStore + ?Sized,
{
    let response = network
        .await
        .map_err(|e| Error::Network(format!("fetch task failed: {e}")))??;

    let stored = match store.put(generation, key, &response).await {
        Ok(()) => {
            tracing::debug!(%key, status = response.status, %generation, "cache entry refreshed");
            true
        }
        Err(e) => {
            tracing::warn!(%key, error = %e, "cache write failed; serving response anyway");
            false
        }
    };

    Ok((response, stored))
}
