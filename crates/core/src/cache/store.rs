//! Keyed store abstraction the controller owns.
//!
//! The controller never reaches for ambient storage; it is handed a
//! `CacheStore`. [`CacheDb`] persists to SQLite, [`super::MemoryStore`]
//! keeps everything in process.

use async_trait::async_trait;

use super::connection::CacheDb;
use crate::Error;
use crate::request::CachedResponse;

/// Storage operations over named cache generations.
///
/// Implementations must make single-key writes atomic; concurrent writes to
/// the same key resolve last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open (or create) a generation. Returns true if it was created.
    async fn open(&self, generation: &str) -> Result<bool, Error>;

    /// All generation names, oldest first.
    async fn generations(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation and its entries. Returns false if absent.
    async fn delete(&self, generation: &str) -> Result<bool, Error>;

    /// Entry for `key` in one generation.
    async fn lookup(&self, generation: &str, key: &str) -> Result<Option<CachedResponse>, Error>;

    /// Entry for `key` in the oldest generation holding it.
    async fn match_any(&self, key: &str) -> Result<Option<CachedResponse>, Error>;

    /// Write one entry, creating the generation if needed.
    async fn put(&self, generation: &str, key: &str, response: &CachedResponse) -> Result<(), Error>;

    /// Write a batch of entries all-or-nothing.
    async fn put_all(&self, generation: &str, entries: &[(String, CachedResponse)]) -> Result<(), Error>;

    /// Keys held by one generation.
    async fn keys(&self, generation: &str) -> Result<Vec<String>, Error>;
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, generation: &str) -> Result<bool, Error> {
        self.open_generation(generation).await
    }

    async fn generations(&self) -> Result<Vec<String>, Error> {
        self.generation_names().await
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        self.delete_generation(generation).await
    }

    async fn lookup(&self, generation: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        self.get_entry(generation, key).await
    }

    async fn match_any(&self, key: &str) -> Result<Option<CachedResponse>, Error> {
        self.match_entry(key).await
    }

    async fn put(&self, generation: &str, key: &str, response: &CachedResponse) -> Result<(), Error> {
        self.put_entry(generation, key, response).await
    }

    async fn put_all(&self, generation: &str, entries: &[(String, CachedResponse)]) -> Result<(), Error> {
        self.put_entries(generation, entries).await
    }

    async fn keys(&self, generation: &str) -> Result<Vec<String>, Error> {
        self.entry_keys(generation).await
    }
}
