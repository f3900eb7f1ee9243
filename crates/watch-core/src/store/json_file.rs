use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};
use watch_models::Document;
use crate::patch::FieldPatch;
use super::{matches_all, DocumentStore, Filter, StoreError, StoredDocument};

/// Document store persisted as one pretty-printed JSON object (`{ id: fields }`).
///
/// The whole file is rewritten after every mutation through a temp file + rename, so a
/// crash never leaves a half-written library behind. A file that fails to parse is an
/// error: unlike a cache, the library cannot be rebuilt from elsewhere.
pub struct JsonFileStore {
    path: PathBuf,
    documents: RwLock<BTreeMap<String, Document>>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let documents = if tokio::fs::try_exists(&path).await? {
            let content = tokio::fs::read_to_string(&path).await?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                let documents: BTreeMap<String, Document> = serde_json::from_str(&content)?;
                info!("Loaded {} documents from {}", documents.len(), path.display());
                documents
            }
        } else {
            debug!("Store file {} does not exist, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            documents: RwLock::new(documents),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, documents: &BTreeMap<String, Document>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(documents)?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        debug!("Store saved: {} documents", documents.len());
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn set(&self, id: &str, fields: Document) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let previous = documents.insert(id.to_string(), fields);
        if let Err(e) = self.persist(&documents).await {
            // Keep memory in line with disk
            match previous {
                Some(doc) => documents.insert(id.to_string(), doc),
                None => documents.remove(id),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn update(&self, id: &str, patch: &FieldPatch) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let previous = document.clone();
        patch.apply_to(document);
        if let Err(e) = self.persist(&documents).await {
            documents.insert(id.to_string(), previous);
            return Err(e);
        }
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
        let mut documents = self.documents.write().await;
        if let Some(previous) = documents.remove(id) {
            if let Err(e) = self.persist(&documents).await {
                documents.insert(id.to_string(), previous);
                return Err(e);
            }
        }
        Ok(())
    }
}
