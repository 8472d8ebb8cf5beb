//! In-process cache store.
//!
//! Generations live in a `Vec` so creation order is kept; each one maps keys
//! to responses plus an insertion counter for stable key listing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::CacheStore;
use crate::Error;
use crate::request::CachedResponse;

#[derive(Debug, Default)]
struct Generation {
    name: String,
    entries: HashMap<String, (u64, CachedResponse)>,
    next_seq: u64,
}

impl Generation {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    fn insert(&mut self, key: &str, mut response: CachedResponse, stored_at: &str) {
        response.stored_at = Some(stored_at.to_string());
        let seq = match self.entries.get(key) {
            Some((seq, _)) => *seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.entries.insert(key.to_string(), (seq, response));
    }
}

/// Cache store held entirely in memory.
///
/// Clones share the same underlying generations.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    generations: Arc<RwLock<Vec<Generation>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn position(generations: &[Generation], name: &str) -> Option<usize> {
    generations.iter().position(|g| g.name == name)
}

fn open_in(generations: &mut Vec<Generation>, name: &str) -> (usize, bool) {
    match position(generations, name) {
        Some(idx) => (idx, false),
        None => {
            generations.push(Generation::new(name));
            (generations.len() - 1, true)
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, generation: &str) -> Result<bool, Error> {
        let mut generations = self.generations.write().await;
        Ok(open_in(&mut generations, generation).1)
    }

    async fn generations(&self) -> Result<Vec<String>, Error> {
        let generations = self.generations.read().await;
        Ok(generations.iter().map(|g| g.name.clone()).collect())
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        let mut generations = self.generations.write().await;
        match position(&generations, generation) {
            Some(idx) => {
                generations.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn lookup(&self, generation: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        let generations = self.generations.read().await;
        Ok(position(&generations, generation)
            .and_then(|idx| generations[idx].entries.get(key))
            .map(|(_, response)| response.clone()))
    }

    async fn match_any(&self, key: &str) -> Result<Option<CachedResponse>, Error> {
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find_map(|g| g.entries.get(key))
            .map(|(_, response)| response.clone()))
    }

    async fn put(&self, generation: &str, key: &str, response: &CachedResponse) -> Result<(), Error> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut generations = self.generations.write().await;
        let (idx, _) = open_in(&mut generations, generation);
        generations[idx].insert(key, response.clone(), &now);
        Ok(())
    }

    async fn put_all(&self, generation: &str, entries: &[(String, CachedResponse)]) -> Result<(), Error> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut generations = self.generations.write().await;
        let (idx, _) = open_in(&mut generations, generation);
        for (key, response) in entries {
            generations[idx].insert(key, response.clone(), &now);
        }
        Ok(())
    }

    async fn keys(&self, generation: &str) -> Result<Vec<String>, Error> {
        let generations = self.generations.read().await;
        let Some(idx) = position(&generations, generation) else {
            return Ok(Vec::new());
        };
        let mut keyed: Vec<_> = generations[idx]
            .entries
            .iter()
            .map(|(key, (seq, _))| (*seq, key.clone()))
            .collect();
        keyed.sort_unstable();
        Ok(keyed.into_iter().map(|(_, key)| key).collect())
    }
}
