use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use watch_models::{parse_count, MediaKind};
use crate::error::CatalogError;

/// What a catalog knows about one title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Positive season count, `None` when the catalog has no usable value
    pub total_seasons: Option<u32>,
}

impl CatalogEntry {
    pub fn with_seasons(total_seasons: u32) -> Self {
        Self { total_seasons: Some(total_seasons).filter(|n| *n > 0) }
    }

    /// Catalogs report season counts as numbers or strings ("5", "N/A").
    /// Zero and anything unparseable mean "not found".
    pub fn from_raw_seasons(raw: Option<&Value>) -> Self {
        Self {
            total_seasons: raw.and_then(parse_count).filter(|n| *n > 0),
        }
    }
}

/// Read-only media catalog used to backfill season metadata.
///
/// Implementations make no promises about latency or availability; rate limiting and
/// failure tolerance are the caller's job.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    fn catalog_name(&self) -> &str;

    async fn lookup(&self, title: &str, kind: MediaKind) -> Result<CatalogEntry, CatalogError>;

    /// Episode count of one season, used when a season's episode list is first needed
    async fn season_episode_count(
        &self,
        _title: &str,
        _season: u32,
    ) -> Result<Option<u32>, CatalogError> {
        Err(CatalogError::Unsupported("season episode lists"))
    }
}

#[async_trait]
impl<T: CatalogLookup + ?Sized> CatalogLookup for Arc<T> {
    fn catalog_name(&self) -> &str {
        (**self).catalog_name()
    }

    async fn lookup(&self, title: &str, kind: MediaKind) -> Result<CatalogEntry, CatalogError> {
        (**self).lookup(title, kind).await
    }

    async fn season_episode_count(
        &self,
        title: &str,
        season: u32,
    ) -> Result<Option<u32>, CatalogError> {
        (**self).season_episode_count(title, season).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_seasons_accepts_string_and_integer() {
        assert_eq!(CatalogEntry::from_raw_seasons(Some(&json!("5"))).total_seasons, Some(5));
        assert_eq!(CatalogEntry::from_raw_seasons(Some(&json!(3))).total_seasons, Some(3));
    }

    #[test]
    fn test_raw_seasons_rejects_unusable_values() {
        assert_eq!(CatalogEntry::from_raw_seasons(None).total_seasons, None);
        assert_eq!(CatalogEntry::from_raw_seasons(Some(&json!("N/A"))).total_seasons, None);
        assert_eq!(CatalogEntry::from_raw_seasons(Some(&json!(0))).total_seasons, None);
        assert_eq!(CatalogEntry::from_raw_seasons(Some(&json!(-2))).total_seasons, None);
        assert_eq!(CatalogEntry::with_seasons(0).total_seasons, None);
    }
}
