//! State transitions for episode-level tracking.
//!
//! Every operation is a pure function from the current `WatchState` to a `Mutation`:
//! the next state plus the `FieldPatch` holding exactly the keys that changed.
//! Persisting the patch is the caller's job. None of these are idempotent at the
//! storage layer (two toggles cancel out), so callers recompute from the freshest
//! state instead of replaying a patch.

use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;
use watch_models::{fields, WatchState};
use crate::patch::FieldPatch;

/// Upper bound for a season length given without a known episode count.
const MAX_EPISODES_PER_SEASON: u32 = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("season numbers start at 1")]
    InvalidSeason,

    #[error("episode numbers start at 1")]
    InvalidEpisode,

    #[error("season {season} is beyond the {total} known seasons")]
    SeasonOutOfRange { season: u32, total: u32 },

    #[error("season {season} has {count} episodes, episode {episode} does not exist")]
    EpisodeOutOfRange { season: u32, episode: u32, count: u32 },

    #[error("episode count for season {season} must be positive")]
    InvalidEpisodeCount { season: u32 },

    #[error("season {season} cannot have {count} episodes (at most {max})")]
    TooManyEpisodes { season: u32, count: u32, max: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub state: WatchState,
    pub patch: FieldPatch,
}

impl Mutation {
    fn unchanged(state: &WatchState) -> Self {
        Self {
            state: state.clone(),
            patch: FieldPatch::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.patch.is_empty()
    }

    /// Chain a follow-up operation on the resulting state, merging both patches
    pub fn then<F>(self, next: F) -> Result<Mutation, MutationError>
    where
        F: FnOnce(&WatchState) -> Result<Mutation, MutationError>,
    {
        let follow_up = next(&self.state)?;
        let mut patch = self.patch;
        patch.merge(follow_up.patch);
        Ok(Mutation {
            state: follow_up.state,
            patch,
        })
    }
}

fn check_season(state: &WatchState, season: u32) -> Result<(), MutationError> {
    if season == 0 {
        return Err(MutationError::InvalidSeason);
    }
    if let Some(total) = state.known_total_seasons() {
        if season > total {
            return Err(MutationError::SeasonOutOfRange { season, total });
        }
    }
    Ok(())
}

fn check_episode(state: &WatchState, season: u32, episode: u32) -> Result<(), MutationError> {
    if episode == 0 {
        return Err(MutationError::InvalidEpisode);
    }
    if let Some(count) = state.episode_count(season) {
        if episode > count {
            return Err(MutationError::EpisodeOutOfRange { season, episode, count });
        }
    }
    Ok(())
}

fn episodes_value(episodes: &BTreeSet<u32>) -> Value {
    Value::Array(episodes.iter().map(|e| Value::from(*e)).collect())
}

/// Write `episodes` as the season's watched set, dropping the key when it is empty.
fn store_season(state: &mut WatchState, patch: &mut FieldPatch, season: u32, episodes: BTreeSet<u32>) {
    let path = fields::season_path(fields::WATCHED_EPISODES, season);
    if episodes.is_empty() {
        state.watched_episodes.remove(&season);
        patch.delete(path);
    } else {
        patch.set(path, episodes_value(&episodes));
        state.watched_episodes.insert(season, episodes);
    }
}

/// Flip one episode between watched and unwatched.
///
/// Adding an episode is bounded by the known season and episode counts; removing one
/// is always allowed so stray legacy entries can be cleaned up.
pub fn toggle_episode(state: &WatchState, season: u32, episode: u32) -> Result<Mutation, MutationError> {
    if season == 0 {
        return Err(MutationError::InvalidSeason);
    }
    if episode == 0 {
        return Err(MutationError::InvalidEpisode);
    }

    let mut next = state.clone();
    let mut episodes = next.watched_episodes.get(&season).cloned().unwrap_or_default();

    if !episodes.remove(&episode) {
        check_season(state, season)?;
        check_episode(state, season, episode)?;
        episodes.insert(episode);
    }

    let mut patch = FieldPatch::new();
    store_season(&mut next, &mut patch, season, episodes);
    Ok(Mutation { state: next, patch })
}

/// Mark episodes `1..=total_episodes` of a season watched. A count of zero clears it.
pub fn mark_all_in_season(
    state: &WatchState,
    season: u32,
    total_episodes: u32,
) -> Result<Mutation, MutationError> {
    check_season(state, season)?;
    if total_episodes == 0 {
        return clear_season(state, season);
    }
    match state.episode_count(season) {
        Some(count) if total_episodes > count => {
            return Err(MutationError::EpisodeOutOfRange { season, episode: total_episodes, count });
        }
        None if total_episodes > MAX_EPISODES_PER_SEASON => {
            return Err(MutationError::TooManyEpisodes {
                season,
                count: total_episodes,
                max: MAX_EPISODES_PER_SEASON,
            });
        }
        _ => {}
    }

    let full: BTreeSet<u32> = (1..=total_episodes).collect();
    if state.watched_episodes.get(&season) == Some(&full) {
        return Ok(Mutation::unchanged(state));
    }

    let mut next = state.clone();
    let mut patch = FieldPatch::new();
    store_season(&mut next, &mut patch, season, full);
    Ok(Mutation { state: next, patch })
}

/// Forget every watched episode of a season.
pub fn clear_season(state: &WatchState, season: u32) -> Result<Mutation, MutationError> {
    if season == 0 {
        return Err(MutationError::InvalidSeason);
    }
    if !state.watched_episodes.contains_key(&season) {
        return Ok(Mutation::unchanged(state));
    }

    let mut next = state.clone();
    let mut patch = FieldPatch::new();
    store_season(&mut next, &mut patch, season, BTreeSet::new());
    Ok(Mutation { state: next, patch })
}

/// Record the resume point. Only changed fields end up in the patch.
pub fn update_resume_point(state: &WatchState, season: u32, episode: u32) -> Result<Mutation, MutationError> {
    if season == 0 {
        return Err(MutationError::InvalidSeason);
    }
    if episode == 0 {
        return Err(MutationError::InvalidEpisode);
    }

    let mut next = state.clone();
    let mut patch = FieldPatch::new();
    if state.current_season != Some(season) {
        next.current_season = Some(season);
        patch.set(fields::CURRENT_SEASON, season);
    }
    if state.current_episode != Some(episode) {
        next.current_episode = Some(episode);
        patch.set(fields::CURRENT_EPISODE, episode);
    }
    Ok(Mutation { state: next, patch })
}

/// Resume point to record after a toggle: the toggled episode if it was just marked,
/// otherwise the latest episode still watched in that season. `None` when the season
/// has nothing left watched.
pub fn resume_point_after_toggle(state_after: &WatchState, season: u32, episode: u32) -> Option<(u32, u32)> {
    if state_after.is_episode_watched(season, episode) {
        Some((season, episode))
    } else {
        state_after
            .latest_watched_in_season(season)
            .map(|latest| (season, latest))
    }
}

/// Store a season's episode count once its episode list is known.
///
/// Watched episodes above the new bound are dropped to keep the set within range.
pub fn record_episode_count(state: &WatchState, season: u32, count: u32) -> Result<Mutation, MutationError> {
    check_season(state, season)?;
    if count == 0 {
        return Err(MutationError::InvalidEpisodeCount { season });
    }

    let mut next = state.clone();
    let mut patch = FieldPatch::new();

    if state.episodes_per_season.get(&season) != Some(&count) {
        next.episodes_per_season.insert(season, count);
        patch.set(fields::season_path(fields::EPISODES_PER_SEASON, season), count);
    }

    if let Some(watched) = state.watched_episodes.get(&season) {
        if watched.iter().any(|e| *e > count) {
            let trimmed: BTreeSet<u32> = watched.iter().copied().filter(|e| *e <= count).collect();
            store_season(&mut next, &mut patch, season, trimmed);
        }
    }

    Ok(Mutation { state: next, patch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::next_episode::{next_episode, NextEpisode};
    use crate::patch::FieldUpdate;
    use serde_json::json;

    fn show() -> WatchState {
        let mut state = WatchState::new();
        state.total_seasons = Some(2);
        state.episodes_per_season.insert(1, 3);
        state.episodes_per_season.insert(2, 2);
        state.watched_episodes.insert(1, [1, 2].into_iter().collect());
        state
    }

    #[test]
    fn test_toggle_adds_sorted_and_patches_one_key() {
        let state = show();
        let mutation = toggle_episode(&state, 1, 3).unwrap();

        assert!(mutation.state.is_episode_watched(1, 3));
        assert_eq!(mutation.patch.len(), 1);
        assert_eq!(
            mutation.patch.get("watchedEpisodes.1"),
            Some(&FieldUpdate::Set(json!([1, 2, 3])))
        );
    }

    #[test]
    fn test_toggle_twice_is_identity() {
        let state = show();
        let once = toggle_episode(&state, 2, 1).unwrap();
        let twice = toggle_episode(&once.state, 2, 1).unwrap();

        assert_eq!(twice.state, state);
        assert_eq!(twice.patch.get("watchedEpisodes.2"), Some(&FieldUpdate::Delete));
    }

    #[test]
    fn test_toggling_last_episode_removes_season_key() {
        let mut state = show();
        state.watched_episodes.insert(2, [2].into_iter().collect());

        let mutation = toggle_episode(&state, 2, 2).unwrap();
        assert!(!mutation.state.watched_episodes.contains_key(&2));
        assert_eq!(mutation.patch.get("watchedEpisodes.2"), Some(&FieldUpdate::Delete));
    }

    #[test]
    fn test_toggle_rejects_out_of_range_additions() {
        let state = show();
        assert_eq!(
            toggle_episode(&state, 1, 4).unwrap_err(),
            MutationError::EpisodeOutOfRange { season: 1, episode: 4, count: 3 }
        );
        assert_eq!(
            toggle_episode(&state, 3, 1).unwrap_err(),
            MutationError::SeasonOutOfRange { season: 3, total: 2 }
        );
        assert_eq!(toggle_episode(&state, 0, 1).unwrap_err(), MutationError::InvalidSeason);
        assert_eq!(toggle_episode(&state, 1, 0).unwrap_err(), MutationError::InvalidEpisode);
    }

    #[test]
    fn test_toggle_can_remove_stray_episode() {
        let mut state = show();
        state.watched_episodes.insert(1, [1, 9].into_iter().collect());
        let mutation = toggle_episode(&state, 1, 9).unwrap();
        assert_eq!(mutation.state.watched_in_season(1), 1);
    }

    #[test]
    fn test_toggle_without_known_counts_is_unbounded() {
        let state = WatchState::new();
        let mutation = toggle_episode(&state, 4, 12).unwrap();
        assert!(mutation.state.is_episode_watched(4, 12));
    }

    #[test]
    fn test_next_episode_walkthrough() {
        let state = show();
        assert_eq!(next_episode(&state), NextEpisode::Episode { season: 1, episode: 3 });

        let state = toggle_episode(&state, 1, 3).unwrap().state;
        assert_eq!(next_episode(&state), NextEpisode::Episode { season: 2, episode: 1 });

        let state = mark_all_in_season(&state, 2, 2).unwrap().state;
        assert_eq!(next_episode(&state), NextEpisode::Complete);
    }

    #[test]
    fn test_mark_all_sets_full_range() {
        let state = show();
        let mutation = mark_all_in_season(&state, 2, 2).unwrap();
        assert_eq!(
            mutation.patch.get("watchedEpisodes.2"),
            Some(&FieldUpdate::Set(json!([1, 2])))
        );
        assert!(mutation.state.is_season_complete(2));
    }

    #[test]
    fn test_mark_all_on_complete_season_is_noop() {
        let state = mark_all_in_season(&show(), 1, 3).unwrap().state;
        assert!(mark_all_in_season(&state, 1, 3).unwrap().is_noop());
    }

    #[test]
    fn test_mark_all_zero_clears() {
        let mutation = mark_all_in_season(&show(), 1, 0).unwrap();
        assert!(!mutation.state.watched_episodes.contains_key(&1));
        assert_eq!(mutation.patch.get("watchedEpisodes.1"), Some(&FieldUpdate::Delete));
    }

    #[test]
    fn test_mark_all_with_unknown_count_is_bounded() {
        let mut state = show();
        state.total_seasons = Some(3);

        let err = mark_all_in_season(&state, 3, 4_000_000_000).unwrap_err();
        assert_eq!(
            err,
            MutationError::TooManyEpisodes { season: 3, count: 4_000_000_000, max: MAX_EPISODES_PER_SEASON }
        );
        assert_eq!(mark_all_in_season(&state, 3, 12).unwrap().state.watched_in_season(3), 12);
    }

    #[test]
    fn test_clear_season() {
        let mutation = clear_season(&show(), 1).unwrap();
        assert!(mutation.state.watched_episodes.is_empty());
        assert_eq!(mutation.patch.len(), 1);

        // Clearing an absent season writes nothing
        assert!(clear_season(&show(), 2).unwrap().is_noop());
    }

    #[test]
    fn test_resume_point_only_patches_changes() {
        let mut state = show();
        state.current_season = Some(1);
        state.current_episode = Some(2);

        let mutation = update_resume_point(&state, 1, 3).unwrap();
        assert_eq!(mutation.patch.len(), 1);
        assert!(mutation.patch.contains("currentEpisode"));
        assert_eq!(mutation.state.current_episode, Some(3));
    }

    #[test]
    fn test_resume_point_after_toggle() {
        let added = toggle_episode(&show(), 1, 3).unwrap().state;
        assert_eq!(resume_point_after_toggle(&added, 1, 3), Some((1, 3)));

        let removed = toggle_episode(&show(), 1, 2).unwrap().state;
        assert_eq!(resume_point_after_toggle(&removed, 1, 2), Some((1, 1)));

        let emptied = clear_season(&show(), 1).unwrap().state;
        assert_eq!(resume_point_after_toggle(&emptied, 1, 1), None);
    }

    #[test]
    fn test_then_merges_patches() {
        let mutation = toggle_episode(&show(), 1, 3)
            .unwrap()
            .then(|s| update_resume_point(s, 1, 3))
            .unwrap();
        assert_eq!(mutation.patch.len(), 3);
        assert_eq!(mutation.state.current_episode, Some(3));
    }

    #[test]
    fn test_record_episode_count_trims_watched() {
        let mut state = WatchState::new();
        state.watched_episodes.insert(1, [1, 5, 8].into_iter().collect());

        let mutation = record_episode_count(&state, 1, 6).unwrap();
        assert_eq!(mutation.state.episode_count(1), Some(6));
        assert_eq!(mutation.state.watched_in_season(1), 2);
        assert_eq!(
            mutation.patch.get("episodesPerSeason.1"),
            Some(&FieldUpdate::Set(json!(6)))
        );
        assert_eq!(
            mutation.patch.get("watchedEpisodes.1"),
            Some(&FieldUpdate::Set(json!([1, 5])))
        );

        assert_eq!(
            record_episode_count(&state, 1, 0).unwrap_err(),
            MutationError::InvalidEpisodeCount { season: 1 }
        );
    }
}
