//! In-memory implementation of `RecordStore`.
//!
//! Not durable: everything is lost when the process exits. Used when no
//! database path is configured and as the backing store in tests. Ids are
//! assigned from one counter shared by all collections.

use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Collection, RecordStore, Row, StoreError, StoreResult};

#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<i64, Row>>>,
    next_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, collection: Collection, mut row: Row) -> StoreResult<Row> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        row.insert("id".into(), Value::from(id));
        if !matches!(row.get("created_at"), Some(Value::String(_))) {
            row.insert("created_at".into(), Value::from(Utc::now().to_rfc3339()));
        }

        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, collection: Collection, id: i64, patch: Row) -> StoreResult<Row> {
        let mut guard = self.collections.write().await;
        let row = guard
            .get_mut(&collection)
            .and_then(|rows| rows.get_mut(&id))
            .ok_or(StoreError::NotFound { collection, id })?;

        for (key, value) in patch {
            if key != "id" {
                row.insert(key, value);
            }
        }
        row.insert("updated_at".into(), Value::from(Utc::now().to_rfc3339()));
        Ok(row.clone())
    }

    async fn delete(&self, collection: Collection, id: i64) -> StoreResult<i64> {
        self.collections
            .write()
            .await
            .get_mut(&collection)
            .and_then(|rows| rows.remove(&id))
            .map(|_| id)
            .ok_or(StoreError::NotFound { collection, id })
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Row>> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let store = MemoryStore::new();
        let created = store
            .create(Collection::Promotions, row(json!({ "id": -4, "title": "Summer", "active": true })))
            .await
            .expect("create");
        let id = created["id"].as_i64().unwrap();
        assert!(id > 0);
        assert!(created.contains_key("created_at"));

        let updated = store
            .update(Collection::Promotions, id, row(json!({ "active": false, "id": 99 })))
            .await
            .expect("update");
        assert_eq!(updated["active"], json!(false));
        assert_eq!(updated["id"], json!(id));

        assert_eq!(store.list(Collection::Promotions).await.unwrap().len(), 1);
        assert!(store.list(Collection::Images).await.unwrap().is_empty());

        assert_eq!(store.delete(Collection::Promotions, id).await.unwrap(), id);
        let err = store.delete(Collection::Promotions, id).await.expect_err("gone");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(Collection::Prices, 12, Row::new())
            .await
            .expect_err("missing");
        assert!(matches!(err, StoreError::NotFound { collection: Collection::Prices, id: 12 }));
    }
}
