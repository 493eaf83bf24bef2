//! Tag name enrichment: in-memory cache mirroring the persistence gateway.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::persistence::TagStore;
use crate::ws::messages::{NameState, ReadResult};

/// Display-name side table merged into relayed read results.
///
/// The cache is loaded once at startup and mirrors the gateway on every
/// mutation; overlapping mutations resolve last-writer-wins. Gateway
/// failures degrade to the in-memory value and are never allowed to fail a
/// relay or crash a connection.
#[derive(Debug)]
pub struct TagService {
    cache: RwLock<HashMap<String, String>>,
    store: Arc<dyn TagStore>,
}

impl TagService {
    /// Creates a service with an empty cache over the given gateway.
    #[must_use]
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// Loads the full name table from the gateway. Runs once at startup;
    /// on gateway error the service starts with an empty cache (degraded
    /// mode) rather than failing startup.
    pub async fn load_all(&self) {
        match self.store.load_all().await {
            Ok(records) => {
                let count = records.len();
                *self.cache.write().await = records;
                tracing::info!(count, "tag name cache loaded");
            }
            Err(err) => {
                tracing::warn!(%err, "tag store unavailable, starting with empty cache");
            }
        }
    }

    /// Attaches stored names to every tag entry in a read result.
    ///
    /// A tag without a record gets an empty one auto-created (cache and
    /// gateway) and is classified `new`; a tag with a record keeps its
    /// stored name and is classified `existing`. Gateway write failures
    /// are logged and never fail the enrichment.
    pub async fn enrich(&self, result: &mut ReadResult) {
        if result.tags.is_empty() {
            return;
        }
        let mut created = Vec::new();
        {
            let mut cache = self.cache.write().await;
            for tag in &mut result.tags {
                match cache.get(&tag.id) {
                    Some(name) => {
                        tag.name = Some(name.clone());
                        tag.name_state = Some(NameState::Existing);
                    }
                    None => {
                        cache.insert(tag.id.clone(), String::new());
                        tag.name = Some(String::new());
                        tag.name_state = Some(NameState::New);
                        created.push(tag.id.clone());
                    }
                }
            }
        }
        for id in created {
            if let Err(err) = self.store.upsert(&id, "").await {
                tracing::warn!(tag_id = %id, %err, "failed to persist auto-created tag record");
            }
        }
    }

    /// Sets or clears the display name for a tag.
    ///
    /// A non-empty name is upserted; an empty (or whitespace-only) name
    /// deletes the record. The gateway write is awaited before the caller
    /// broadcasts the update; on gateway failure the cache still updates
    /// and the update still goes out, at the cost of durability.
    ///
    /// Returns the canonical stored value, `None` after a deletion.
    pub async fn set_name(&self, id: &str, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            if let Err(err) = self.store.delete(id).await {
                tracing::warn!(tag_id = %id, %err, "failed to delete tag record, clearing cached name only");
            }
            self.cache.write().await.remove(id);
            tracing::info!(tag_id = %id, "tag name cleared");
            None
        } else {
            if let Err(err) = self.store.upsert(id, name).await {
                tracing::warn!(tag_id = %id, %err, "failed to persist tag name, keeping cached value");
            }
            self.cache
                .write()
                .await
                .insert(id.to_string(), name.to_string());
            tracing::info!(tag_id = %id, name, "tag name set");
            Some(name.to_string())
        }
    }

    /// Lists full records from the gateway (admin surface).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GatewayError::PersistenceError`] when the
    /// gateway is unavailable.
    pub async fn list(
        &self,
    ) -> Result<Vec<crate::persistence::models::TagRecord>, crate::error::GatewayError> {
        self.store.list().await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::persistence::memory::MemoryTagStore;
    use crate::ws::messages::TagReading;
    use async_trait::async_trait;

    fn reading(id: &str) -> TagReading {
        TagReading {
            id: id.to_string(),
            rssi: Some(serde_json::Number::from(-40)),
            count: None,
            name: None,
            name_state: None,
            extra: serde_json::Map::new(),
        }
    }

    fn result_with(ids: &[&str]) -> ReadResult {
        ReadResult {
            count: Some(ids.len() as u64),
            read_ms: Some(100),
            tags: ids.iter().map(|id| reading(id)).collect(),
            extra: serde_json::Map::new(),
        }
    }

    fn service() -> (TagService, Arc<MemoryTagStore>) {
        let store = Arc::new(MemoryTagStore::default());
        let service = TagService::new(Arc::clone(&store) as Arc<dyn TagStore>);
        (service, store)
    }

    /// Gateway double that fails every call.
    #[derive(Debug)]
    struct FailingStore;

    #[async_trait]
    impl TagStore for FailingStore {
        async fn load_all(&self) -> Result<HashMap<String, String>, GatewayError> {
            Err(GatewayError::PersistenceError("down".to_string()))
        }
        async fn upsert(&self, _id: &str, _name: &str) -> Result<(), GatewayError> {
            Err(GatewayError::PersistenceError("down".to_string()))
        }
        async fn delete(&self, _id: &str) -> Result<(), GatewayError> {
            Err(GatewayError::PersistenceError("down".to_string()))
        }
        async fn list(
            &self,
        ) -> Result<Vec<crate::persistence::models::TagRecord>, GatewayError> {
            Err(GatewayError::PersistenceError("down".to_string()))
        }
    }

    #[tokio::test]
    async fn set_then_enrich_reports_existing() {
        let (service, _store) = service();
        let stored = service.set_name("E1", "Alice").await;
        assert_eq!(stored.as_deref(), Some("Alice"));

        let mut result = result_with(&["E1"]);
        service.enrich(&mut result).await;

        let Some(tag) = result.tags.first() else {
            panic!("missing tag");
        };
        assert_eq!(tag.name.as_deref(), Some("Alice"));
        assert_eq!(tag.name_state, Some(NameState::Existing));
    }

    #[tokio::test]
    async fn clear_then_enrich_reports_new_again() {
        let (service, store) = service();
        let _ = service.set_name("E1", "Alice").await;
        let cleared = service.set_name("E1", "").await;
        assert_eq!(cleared, None);

        let mut result = result_with(&["E1"]);
        service.enrich(&mut result).await;

        let Some(tag) = result.tags.first() else {
            panic!("missing tag");
        };
        assert_eq!(tag.name.as_deref(), Some(""));
        assert_eq!(tag.name_state, Some(NameState::New));

        // The deletion reached the gateway before the re-read recreated it.
        let Ok(records) = store.load_all().await else {
            panic!("store unavailable");
        };
        assert_eq!(records.get("E1").map(String::as_str), Some(""));
    }

    #[tokio::test]
    async fn enrich_auto_creates_empty_records() {
        let (service, store) = service();
        let mut result = result_with(&["E1", "E2"]);
        service.enrich(&mut result).await;

        for tag in &result.tags {
            assert_eq!(tag.name_state, Some(NameState::New));
            assert_eq!(tag.name.as_deref(), Some(""));
        }
        let Ok(records) = store.load_all().await else {
            panic!("store unavailable");
        };
        assert_eq!(records.len(), 2);

        // A second read of the same tags now finds existing records.
        let mut again = result_with(&["E1", "E2"]);
        service.enrich(&mut again).await;
        for tag in &again.tags {
            assert_eq!(tag.name_state, Some(NameState::Existing));
        }
    }

    #[tokio::test]
    async fn whitespace_name_clears_record() {
        let (service, store) = service();
        let _ = service.set_name("E1", "Alice").await;
        let cleared = service.set_name("E1", "   ").await;
        assert_eq!(cleared, None);
        let Ok(records) = store.load_all().await else {
            panic!("store unavailable");
        };
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn load_all_failure_degrades_to_empty_cache() {
        let service = TagService::new(Arc::new(FailingStore) as Arc<dyn TagStore>);
        service.load_all().await;

        let mut result = result_with(&["E1"]);
        service.enrich(&mut result).await;
        let Some(tag) = result.tags.first() else {
            panic!("missing tag");
        };
        assert_eq!(tag.name_state, Some(NameState::New));
    }

    #[tokio::test]
    async fn gateway_failure_keeps_cached_value() {
        let service = TagService::new(Arc::new(FailingStore) as Arc<dyn TagStore>);
        let stored = service.set_name("E1", "Alice").await;
        // The write failed durably but the caller still gets the value to
        // broadcast.
        assert_eq!(stored.as_deref(), Some("Alice"));

        let mut result = result_with(&["E1"]);
        service.enrich(&mut result).await;
        let Some(tag) = result.tags.first() else {
            panic!("missing tag");
        };
        assert_eq!(tag.name.as_deref(), Some("Alice"));
        assert_eq!(tag.name_state, Some(NameState::Existing));
    }
}
