//! Interactive episode edits against a store.
//!
//! Each action re-reads the item, computes the mutation on that fresh state and writes
//! only the changed fields. Concurrent editors are not coordinated: the last write wins.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use watch_models::{SeriesItem, WatchState};
use crate::mutator::{self, Mutation, MutationError};
use crate::patch::FieldPatch;
use crate::store::{load_series, DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error("season {0} has no known episode count; pass it explicitly")]
    UnknownEpisodeCount(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EpisodeAction {
    Toggle { season: u32, episode: u32 },
    /// `episodes` falls back to the stored count for the season
    MarkSeason { season: u32, episodes: Option<u32> },
    ClearSeason { season: u32 },
}

#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub item: SeriesItem,
    pub before: WatchState,
    pub patch: FieldPatch,
}

impl ActionOutcome {
    pub fn changed(&self) -> bool {
        !self.patch.is_empty()
    }
}

/// Compute the full mutation for an action, resume point included.
pub fn plan_action(state: &WatchState, action: EpisodeAction) -> Result<Mutation, TrackError> {
    let mutation = match action {
        EpisodeAction::Toggle { season, episode } => {
            let toggled = mutator::toggle_episode(state, season, episode)?;
            match mutator::resume_point_after_toggle(&toggled.state, season, episode) {
                Some((s, e)) => toggled.then(|next| mutator::update_resume_point(next, s, e))?,
                None => toggled,
            }
        }
        EpisodeAction::MarkSeason { season, episodes } => {
            let count = episodes
                .or_else(|| state.episode_count(season))
                .ok_or(TrackError::UnknownEpisodeCount(season))?;
            let marked = mutator::mark_all_in_season(state, season, count)?;
            if count > 0 {
                marked.then(|next| mutator::update_resume_point(next, season, count))?
            } else {
                marked
            }
        }
        EpisodeAction::ClearSeason { season } => mutator::clear_season(state, season)?,
    };
    Ok(mutation)
}

pub async fn apply_action(
    store: &dyn DocumentStore,
    item_id: &str,
    action: EpisodeAction,
) -> Result<ActionOutcome, TrackError> {
    let item = load_series(store, item_id).await?;
    let mutation = plan_action(&item.state, action)?;

    if !mutation.is_noop() {
        store.update(item_id, &mutation.patch).await?;
        debug!("Applied {:?} to {} ({} fields)", action, item_id, mutation.patch.len());
    }

    let before = item.state.clone();
    Ok(ActionOutcome {
        item: item.with_state(mutation.state),
        before,
        patch: mutation.patch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn store_with(state: WatchState) -> MemoryStore {
        let store = MemoryStore::new();
        let item = SeriesItem::new("dark", "alice", "Dark").with_state(state);
        store.set("dark", item.to_document()).await.unwrap();
        store
    }

    fn counted() -> WatchState {
        let mut state = WatchState::new();
        state.total_seasons = Some(2);
        state.episodes_per_season.insert(1, 3);
        state.episodes_per_season.insert(2, 2);
        state
    }

    #[tokio::test]
    async fn test_toggle_persists_and_moves_resume_point() {
        let store = store_with(counted()).await;

        let outcome = apply_action(&store, "dark", EpisodeAction::Toggle { season: 1, episode: 2 })
            .await
            .unwrap();
        assert!(outcome.changed());
        assert!(!outcome.before.is_episode_watched(1, 2));

        let saved = load_series(&store, "dark").await.unwrap().state;
        assert!(saved.is_episode_watched(1, 2));
        assert_eq!((saved.current_season, saved.current_episode), (Some(1), Some(2)));
        assert_eq!(saved, outcome.item.state);
    }

    #[tokio::test]
    async fn test_untoggle_falls_back_to_latest_watched() {
        let mut state = counted();
        state.watched_episodes.insert(1, [1, 2, 3].into_iter().collect());
        let store = store_with(state).await;

        apply_action(&store, "dark", EpisodeAction::Toggle { season: 1, episode: 3 })
            .await
            .unwrap();

        let saved = load_series(&store, "dark").await.unwrap().state;
        assert_eq!(saved.current_episode, Some(2));
    }

    #[tokio::test]
    async fn test_mark_season_uses_stored_count() {
        let store = store_with(counted()).await;

        apply_action(&store, "dark", EpisodeAction::MarkSeason { season: 2, episodes: None })
            .await
            .unwrap();

        let saved = load_series(&store, "dark").await.unwrap().state;
        assert!(saved.is_season_complete(2));
        assert_eq!((saved.current_season, saved.current_episode), (Some(2), Some(2)));
    }

    #[tokio::test]
    async fn test_mark_season_without_count_fails() {
        let store = store_with(WatchState::new()).await;

        let err = apply_action(&store, "dark", EpisodeAction::MarkSeason { season: 1, episodes: None })
            .await
            .unwrap_err();
        assert!(matches!(err, TrackError::UnknownEpisodeCount(1)));
    }

    #[tokio::test]
    async fn test_clear_season_keeps_resume_point() {
        let mut state = counted();
        state.watched_episodes.insert(1, [1, 2].into_iter().collect());
        state.current_season = Some(1);
        state.current_episode = Some(2);
        let store = store_with(state).await;

        let outcome = apply_action(&store, "dark", EpisodeAction::ClearSeason { season: 1 })
            .await
            .unwrap();
        assert_eq!(outcome.patch.len(), 1);

        let saved = load_series(&store, "dark").await.unwrap().state;
        assert!(saved.watched_episodes.is_empty());
        assert_eq!(saved.current_episode, Some(2));
    }

    #[tokio::test]
    async fn test_failed_write_surfaces_error() {
        let store = store_with(counted()).await;
        store.fail_writes_for("dark");

        let err = apply_action(&store, "dark", EpisodeAction::Toggle { season: 1, episode: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, TrackError::Store(StoreError::Backend(_))));

        let saved = load_series(&store, "dark").await.unwrap().state;
        assert!(saved.watched_episodes.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_action_is_rejected_before_writing() {
        let store = store_with(counted()).await;

        let err = apply_action(&store, "dark", EpisodeAction::Toggle { season: 3, episode: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, TrackError::Mutation(MutationError::SeasonOutOfRange { .. })));
    }
}
