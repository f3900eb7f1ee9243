use serde::Serialize;
use tracing::{debug, info, warn};
use watch_models::{fields, SeriesItem, WatchState};
use crate::patch::FieldPatch;
use crate::store::{user_series_filters, DocumentStore, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub examined: usize,
    pub repaired: usize,
    pub failed: usize,
}

/// Per-session state owned by the caller.
///
/// The normalization cleanup runs at most once per context; a new context runs it again.
#[derive(Debug, Default)]
pub struct SessionContext {
    cleanup_done: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cleanup_done(&self) -> bool {
        self.cleanup_done
    }

    /// Sanitize every series of the user and write back the items that changed.
    ///
    /// Returns `None` when the cleanup already ran on this context. Items that fail to
    /// parse or save are counted and left as they are.
    pub async fn ensure_cleanup(
        &mut self,
        store: &dyn DocumentStore,
        user_id: &str,
    ) -> Result<Option<CleanupReport>, StoreError> {
        if self.cleanup_done {
            debug!("Cleanup already ran in this session");
            return Ok(None);
        }

        let documents = store.query(&user_series_filters(user_id)).await?;
        let mut report = CleanupReport {
            examined: documents.len(),
            ..CleanupReport::default()
        };

        for document in &documents {
            let mut item = match SeriesItem::from_document(&document.id, &document.fields) {
                Ok(item) => item,
                Err(e) => {
                    warn!("Cleanup skipped {}: {}", document.id, e);
                    report.failed += 1;
                    continue;
                }
            };

            if !item.state.sanitize() {
                continue;
            }

            match store.update(&item.id, &normalized_patch(&item.state)).await {
                Ok(()) => report.repaired += 1,
                Err(e) => {
                    warn!("Failed to save cleaned-up item {}: {}", item.id, e);
                    report.failed += 1;
                }
            }
        }

        self.cleanup_done = true;
        info!(
            "Cleanup finished: {} examined, {} repaired, {} failed",
            report.examined, report.repaired, report.failed
        );
        Ok(Some(report))
    }
}

/// Whole-field rewrite of the two season-keyed maps.
fn normalized_patch(state: &WatchState) -> FieldPatch {
    let mut patch = FieldPatch::new();
    match serde_json::to_value(&state.watched_episodes) {
        Ok(value) if !state.watched_episodes.is_empty() => {
            patch.set(fields::WATCHED_EPISODES, value);
        }
        _ => {
            patch.delete(fields::WATCHED_EPISODES);
        }
    }
    match serde_json::to_value(&state.episodes_per_season) {
        Ok(value) if !state.episodes_per_season.is_empty() => {
            patch.set(fields::EPISODES_PER_SEASON, value);
        }
        _ => {
            patch.delete(fields::EPISODES_PER_SEASON);
        }
    }
    if !state.watched_seasons.is_empty() {
        let seasons: Vec<u32> = state.watched_seasons.iter().copied().collect();
        patch.set(fields::WATCHED_SEASONS, seasons);
    } else {
        patch.delete(fields::WATCHED_SEASONS);
    }
    patch
}
