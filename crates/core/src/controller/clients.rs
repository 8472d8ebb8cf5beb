//! Open client pages and which cache version controls them.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

/// Registry of open clients.
///
/// A client opened before activation stays uncontrolled until the
/// controller claims it.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<BTreeMap<String, Option<String>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an open client, optionally already controlled by `version`.
    pub async fn open(&self, id: &str, version: Option<&str>) {
        let mut clients = self.clients.write().await;
        clients.insert(id.to_string(), version.map(str::to_string));
    }

    /// Forget a closed client. Returns false if it wasn't open.
    pub async fn close(&self, id: &str) -> bool {
        self.clients.write().await.remove(id).is_some()
    }

    /// Take control of every open client. Returns how many changed hands.
    pub async fn claim(&self, version: &str) -> usize {
        let mut clients = self.clients.write().await;
        let mut claimed = 0;
        for controller in clients.values_mut() {
            if controller.as_deref() != Some(version) {
                *controller = Some(version.to_string());
                claimed += 1;
            }
        }
        claimed
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.clients.read().await.contains_key(id)
    }

    /// Version controlling a client, if any.
    pub async fn controller_of(&self, id: &str) -> Option<String> {
        self.clients.read().await.get(id).cloned().flatten()
    }

    /// Number of clients controlled by `version`.
    pub async fn controlled_by(&self, version: &str) -> usize {
        self.clients
            .read()
            .await
            .values()
            .filter(|c| c.as_deref() == Some(version))
            .count()
    }

    pub async fn count(&self) -> usize {
        self.clients.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_takes_uncontrolled_and_stale_clients() {
        let registry = ClientRegistry::new();
        registry.open("tab-1", None).await;
        registry.open("tab-2", Some("app-v2")).await;
        registry.open("tab-3", Some("app-v3")).await;

        assert_eq!(registry.claim("app-v3").await, 2);
        assert_eq!(registry.controlled_by("app-v3").await, 3);
        assert_eq!(registry.controller_of("tab-1").await.as_deref(), Some("app-v3"));
    }

    #[tokio::test]
    async fn test_close_client() {
        let registry = ClientRegistry::new();
        registry.open("tab-1", None).await;

        assert!(registry.close("tab-1").await);
        assert!(!registry.close("tab-1").await);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_client_has_no_controller() {
        let registry = ClientRegistry::new();
        assert!(registry.controller_of("nope").await.is_none());
        assert!(!registry.contains("nope").await);

        registry.open("tab-1", None).await;
        assert!(registry.contains("tab-1").await);
        assert!(registry.controller_of("tab-1").await.is_none());
    }
}
