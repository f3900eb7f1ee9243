//! Generic document persistence.
//!
//! The rest of the crate only talks to `DocumentStore`; the concrete stores here are an
//! in-memory map (tests, embedding) and a single JSON file (the CLI).

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use watch_models::{fields, Document, MediaKind, ModelError, SeriesItem};
use crate::patch::FieldPatch;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("invalid document: {0}")]
    Invalid(#[from] ModelError),

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Field equality filter used by `query`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), value: value.into() }
    }

    pub fn matches(&self, document: &Document) -> bool {
        document.get(&self.field) == Some(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create or fully replace a document
    async fn set(&self, id: &str, fields: Document) -> Result<(), StoreError>;

    /// Apply a partial update; the document must exist
    async fn update(&self, id: &str, patch: &FieldPatch) -> Result<(), StoreError>;

    /// Documents matching every filter, in the store's stable order
    async fn query(&self, filters: &[Filter]) -> Result<Vec<StoredDocument>, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Filters selecting one user's series items
pub fn user_series_filters(user_id: &str) -> Vec<Filter> {
    vec![
        Filter::eq(fields::USER_ID, user_id),
        Filter::eq(fields::KIND, MediaKind::Series.as_str()),
    ]
}

/// Load a series item, failing on missing or non-series documents
pub async fn load_series(store: &dyn DocumentStore, id: &str) -> Result<SeriesItem, StoreError> {
    let document = store
        .get(id)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    Ok(SeriesItem::series_from_document(id, &document)?)
}

pub(crate) fn matches_all(filters: &[Filter], document: &Document) -> bool {
    filters.iter().all(|f| f.matches(document))
}
