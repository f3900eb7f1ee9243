use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use watch_sources::{CatalogError, CatalogLookup};
use crate::mutator::{record_episode_count, MutationError};
use crate::store::{load_series, DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("catalog lookup failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// The count was already stored
    Known(u32),
    /// Fetched from the catalog and persisted
    Fetched(u32),
    /// The catalog has no episode list for this season yet
    Unavailable,
}

impl BackfillOutcome {
    pub fn count(&self) -> Option<u32> {
        match self {
            BackfillOutcome::Known(n) | BackfillOutcome::Fetched(n) => Some(*n),
            BackfillOutcome::Unavailable => None,
        }
    }
}

/// Fills `episodesPerSeason` lazily, the first time a season's episode list is needed.
pub struct EpisodeCountBackfill {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<dyn CatalogLookup>,
}

impl EpisodeCountBackfill {
    pub fn new(store: Arc<dyn DocumentStore>, catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { store, catalog }
    }

    pub async fn ensure_episode_count(&self, item_id: &str, season: u32) -> Result<BackfillOutcome, BackfillError> {
        let item = load_series(self.store.as_ref(), item_id).await?;
        if let Some(count) = item.state.episode_count(season) {
            return Ok(BackfillOutcome::Known(count));
        }

        let title = item.display_title();
        let count = match self.catalog.season_episode_count(title, season).await? {
            Some(count) if count > 0 => count,
            _ => {
                debug!("No episode list for '{}' season {}", title, season);
                return Ok(BackfillOutcome::Unavailable);
            }
        };

        let mutation = record_episode_count(&item.state, season, count)?;
        if !mutation.is_noop() {
            self.store.update(item_id, &mutation.patch).await?;
        }
        info!("Stored {} episodes for '{}' season {}", count, title, season);
        Ok(BackfillOutcome::Fetched(count))
    }
}
