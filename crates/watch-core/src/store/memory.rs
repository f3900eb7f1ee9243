use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use tokio::sync::RwLock;
use watch_models::Document;
use crate::patch::FieldPatch;
use super::{matches_all, DocumentStore, Filter, StoreError, StoredDocument};

/// Document store backed by an in-process map, ordered by id.
///
/// Writes to ids registered with `fail_writes_for` return `StoreError::Backend`,
/// which lets callers exercise their persistence-failure paths.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, Document>>,
    failing_writes: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes_for(&self, id: &str) {
        if let Ok(mut failing) = self.failing_writes.lock() {
            failing.insert(id.to_string());
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing_writes.lock() {
            failing.clear();
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    fn check_writable(&self, id: &str) -> Result<(), StoreError> {
        let failing = self
            .failing_writes
            .lock()
            .map(|f| f.contains(id))
            .unwrap_or(false);
        if failing {
            return Err(StoreError::Backend(format!("write rejected for {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn set(&self, id: &str, fields: Document) -> Result<(), StoreError> {
        self.check_writable(id)?;
        self.documents.write().await.insert(id.to_string(), fields);
        Ok(())
    }

    async fn update(&self, id: &str, patch: &FieldPatch) -> Result<(), StoreError> {
        self.check_writable(id)?;
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply_to(document);
        Ok(())
    }

    async fn query(&self, filters: &[Filter]) -> Result<Vec<StoredDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|(_, doc)| matches_all(filters, doc))
            .map(|(id, doc)| StoredDocument { id: id.clone(), fields: doc.clone() })
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.check_writable(id)?;
        self.documents.write().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_query_filters_by_equality() {
        let store = MemoryStore::new();
        store.set("a", doc(json!({ "userId": "u1", "type": "series" }))).await.unwrap();
        store.set("b", doc(json!({ "userId": "u1", "type": "movie" }))).await.unwrap();
        store.set("c", doc(json!({ "userId": "u2", "type": "series" }))).await.unwrap();

        let found = store.query(&super::super::user_series_filters("u1")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryStore::new();
        let mut patch = FieldPatch::new();
        patch.set("watched", true);
        assert!(matches!(store.update("nope", &patch).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let store = MemoryStore::new();
        store.set("a", doc(json!({}))).await.unwrap();
        store.fail_writes_for("a");

        let mut patch = FieldPatch::new();
        patch.set("watched", true);
        assert!(matches!(store.update("a", &patch).await, Err(StoreError::Backend(_))));

        store.clear_failures();
        store.update("a", &patch).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().unwrap()["watched"], json!(true));
    }

    #[tokio::test]
    async fn test_delete_removes_document() {
        let store = MemoryStore::new();
        store.set("a", doc(json!({ "title": "x" }))).await.unwrap();
        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        assert_eq!(store.len().await, 0);
    }
}
