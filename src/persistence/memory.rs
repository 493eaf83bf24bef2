//! In-memory tag store for tests and persistence-disabled deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::TagStore;
use super::models::TagRecord;
use crate::error::GatewayError;

/// Tag store that keeps records in a process-local map.
///
/// Upsert and delete are atomic per key behind the write lock, matching the
/// contract the PostgreSQL backend provides.
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    records: RwLock<HashMap<String, (String, DateTime<Utc>)>>,
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn load_all(&self) -> Result<HashMap<String, String>, GatewayError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .map(|(id, (name, _))| (id.clone(), name.clone()))
            .collect())
    }

    async fn upsert(&self, id: &str, name: &str) -> Result<(), GatewayError> {
        self.records
            .write()
            .await
            .insert(id.to_string(), (name.to_string(), Utc::now()));
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<TagRecord>, GatewayError> {
        let mut records: Vec<TagRecord> = self
            .records
            .read()
            .await
            .iter()
            .map(|(id, (name, updated_at))| TagRecord {
                id: id.clone(),
                name: name.clone(),
                updated_at: *updated_at,
            })
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn upsert_replaces_existing_name() {
        let store = MemoryTagStore::default();
        assert_ok!(store.upsert("E1", "first").await);
        assert_ok!(store.upsert("E1", "second").await);

        let Ok(all) = store.load_all().await else {
            panic!("load failed");
        };
        assert_eq!(all.len(), 1);
        assert_eq!(all.get("E1").map(String::as_str), Some("second"));
    }

    #[tokio::test]
    async fn delete_missing_record_is_ok() {
        let store = MemoryTagStore::default();
        assert_ok!(store.delete("nope").await);
    }

    #[tokio::test]
    async fn list_orders_by_most_recent() {
        let store = MemoryTagStore::default();
        assert_ok!(store.upsert("old", "a").await);
        assert_ok!(store.upsert("new", "b").await);

        let Ok(records) = store.list().await else {
            panic!("list failed");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(records.first().map(|r| r.id.as_str()), Some("new"));
    }
}
