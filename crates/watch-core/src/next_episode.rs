use serde::Serialize;
use std::fmt;
use watch_models::WatchState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NextEpisode {
    Episode { season: u32, episode: u32 },
    /// No gap found among seasons whose episode count is known
    Complete,
}

impl fmt::Display for NextEpisode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextEpisode::Episode { season, episode } => write!(f, "S{:02}E{:02}", season, episode),
            NextEpisode::Complete => f.write_str("complete"),
        }
    }
}

/// First unwatched episode in (season, episode) order.
///
/// Seasons whose episode count is unknown are skipped, so the answer can be `Complete`
/// while work remains in seasons that have not been backfilled yet. An unknown or zero
/// season count also yields `Complete`.
pub fn next_episode(state: &WatchState) -> NextEpisode {
    let total_seasons = match state.known_total_seasons() {
        Some(total) => total,
        None => return NextEpisode::Complete,
    };

    for season in 1..=total_seasons {
        let Some(count) = state.episode_count(season) else {
            continue;
        };
        for episode in 1..=count {
            if !state.is_episode_watched(season, episode) {
                return NextEpisode::Episode { season, episode };
            }
        }
    }

    NextEpisode::Complete
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_season_show() -> WatchState {
        let mut state = WatchState::new();
        state.total_seasons = Some(2);
        state.episodes_per_season.insert(1, 3);
        state.episodes_per_season.insert(2, 2);
        state.watched_episodes.insert(1, [1, 2].into_iter().collect());
        state
    }

    #[test]
    fn test_first_gap_in_first_season() {
        assert_eq!(
            next_episode(&two_season_show()),
            NextEpisode::Episode { season: 1, episode: 3 }
        );
    }

    #[test]
    fn test_gap_before_later_watched_episode() {
        let mut state = two_season_show();
        state.watched_episodes.insert(1, [1, 3].into_iter().collect());
        assert_eq!(next_episode(&state), NextEpisode::Episode { season: 1, episode: 2 });
    }

    #[test]
    fn test_unknown_season_counts_are_skipped() {
        let mut state = two_season_show();
        state.watched_episodes.insert(1, [1, 2, 3].into_iter().collect());
        state.episodes_per_season.remove(&2);
        assert_eq!(next_episode(&state), NextEpisode::Complete);
    }

    #[test]
    fn test_unknown_total_seasons_is_complete() {
        let mut state = two_season_show();
        state.total_seasons = None;
        assert_eq!(next_episode(&state), NextEpisode::Complete);
        state.total_seasons = Some(0);
        assert_eq!(next_episode(&state), NextEpisode::Complete);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(NextEpisode::Episode { season: 2, episode: 10 }.to_string(), "S02E10");
        assert_eq!(NextEpisode::Complete.to_string(), "complete");
    }
}
