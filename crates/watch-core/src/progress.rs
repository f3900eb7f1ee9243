use serde::Serialize;
use watch_models::WatchState;

/// Aggregate episode progress of one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total_watched: u64,
    pub total_episodes: u64,
    pub percentage: u8,
}

/// Watched/total for a single season; `total` is `None` while the count is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonProgress {
    pub season: u32,
    pub watched: u32,
    pub total: Option<u32>,
}

impl SeasonProgress {
    pub fn is_complete(&self) -> bool {
        matches!(self.total, Some(t) if t > 0 && self.watched >= t)
    }
}

/// Total episodes come from seasons with a known count; watched episodes are counted
/// over every recorded season. The percentage is rounded and capped at 100, since
/// watched episodes in seasons without a known count have no denominator yet.
pub fn calculate_progress(state: &WatchState) -> Progress {
    let total_episodes = state
        .episodes_per_season
        .values()
        .fold(0u64, |acc, count| acc.saturating_add(u64::from(*count)));
    let total_watched = state
        .watched_episodes
        .values()
        .fold(0u64, |acc, episodes| acc.saturating_add(episodes.len() as u64));

    let percentage = if total_episodes > 0 {
        let raw = (100.0 * total_watched as f64 / total_episodes as f64).round();
        raw.min(100.0) as u8
    } else {
        0
    };

    Progress {
        total_watched,
        total_episodes,
        percentage,
    }
}

pub fn season_progress(state: &WatchState, season: u32) -> SeasonProgress {
    SeasonProgress {
        season,
        watched: state.watched_in_season(season),
        total: state.episode_count(season),
    }
}

/// Per-season breakdown for seasons `1..=totalSeasons`, plus any season that has
/// watched episodes beyond a known or unknown season count.
pub fn all_season_progress(state: &WatchState) -> Vec<SeasonProgress> {
    let mut seasons: std::collections::BTreeSet<u32> =
        (1..=state.known_total_seasons().unwrap_or(0)).collect();
    seasons.extend(state.watched_episodes.keys().copied());
    seasons.extend(state.episodes_per_season.keys().copied());
    seasons
        .into_iter()
        .filter(|s| *s > 0)
        .map(|s| season_progress(state, s))
        .collect()
}
