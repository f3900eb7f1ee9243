use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Per-series watch progress as persisted on the item document.
///
/// `watched_episodes` is the fine-grained track (season -> episode numbers),
/// `watched_seasons` is the legacy coarse-grained track. The two are kept as
/// independent fields; `derived_watched_seasons` reports what the fine-grained
/// track implies without touching the legacy one.
///
/// Ordered collections are used throughout so iteration (and the persisted
/// arrays) are always ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchState {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_count"
    )]
    pub total_seasons: Option<u32>,

    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "lenient_episode_counts"
    )]
    pub episodes_per_season: BTreeMap<u32, u32>,

    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "lenient_watched_episodes"
    )]
    pub watched_episodes: BTreeMap<u32, BTreeSet<u32>>,

    #[serde(
        default,
        skip_serializing_if = "BTreeSet::is_empty",
        deserialize_with = "lenient_number_set"
    )]
    pub watched_seasons: BTreeSet<u32>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_count"
    )]
    pub current_season: Option<u32>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_count"
    )]
    pub current_episode: Option<u32>,

    #[serde(default)]
    pub watched: bool,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Season count if known and positive.
    pub fn known_total_seasons(&self) -> Option<u32> {
        self.total_seasons.filter(|n| *n > 0)
    }

    /// Episode count for a season if known and positive.
    pub fn episode_count(&self, season: u32) -> Option<u32> {
        self.episodes_per_season.get(&season).copied().filter(|n| *n > 0)
    }

    pub fn is_episode_watched(&self, season: u32, episode: u32) -> bool {
        self.watched_episodes
            .get(&season)
            .map(|set| set.contains(&episode))
            .unwrap_or(false)
    }

    /// Number of watched episodes recorded for one season.
    pub fn watched_in_season(&self, season: u32) -> u32 {
        self.watched_episodes
            .get(&season)
            .map(|set| set.len() as u32)
            .unwrap_or(0)
    }

    /// Highest watched episode in a season, used to pick a resume point.
    pub fn latest_watched_in_season(&self, season: u32) -> Option<u32> {
        self.watched_episodes
            .get(&season)
            .and_then(|set| set.iter().next_back().copied())
    }

    /// A season is fully watched when its bound is known and every episode is in the set.
    pub fn is_season_complete(&self, season: u32) -> bool {
        match self.episode_count(season) {
            Some(count) => self.watched_in_season(season) == count,
            None => false,
        }
    }

    /// Seasons that the per-episode data says are fully watched.
    pub fn derived_watched_seasons(&self) -> BTreeSet<u32> {
        self.watched_episodes
            .keys()
            .copied()
            .filter(|season| self.is_season_complete(*season))
            .collect()
    }

    /// Re-establish the structural invariants on data loaded from storage.
    ///
    /// Drops season 0 and episode 0 entries, episodes above a known season bound,
    /// episode counts for seasons past a known season count and empty episode sets.
    /// Watched episodes are never dropped for exceeding the season count.
    /// Returns `true` if anything was changed.
    pub fn sanitize(&mut self) -> bool {
        let before = self.clone();
        let total = self.known_total_seasons();

        self.episodes_per_season
            .retain(|season, count| *season > 0 && *count > 0 && total.map_or(true, |t| *season <= t));

        let bounds = self.episodes_per_season.clone();
        for (season, episodes) in self.watched_episodes.iter_mut() {
            let bound = bounds.get(season).copied();
            episodes.retain(|e| *e > 0 && bound.map_or(true, |b| *e <= b));
        }
        self.watched_episodes
            .retain(|season, episodes| *season > 0 && !episodes.is_empty());

        self.watched_seasons.retain(|season| *season > 0);

        *self != before
    }
}

/// Accepts an integer, a numeric string or null. Anything non-numeric or negative is
/// treated as absent, which is how legacy documents with `"N/A"` or `-1` behave.
pub fn parse_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_count))
}

fn lenient_number_set<'de, D>(deserializer: D) -> Result<BTreeSet<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(number_set(value.as_ref()))
}

fn number_set(value: Option<&Value>) -> BTreeSet<u32> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(parse_count).collect(),
        _ => BTreeSet::new(),
    }
}

fn lenient_episode_counts<'de, D>(deserializer: D) -> Result<BTreeMap<u32, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let mut counts = BTreeMap::new();
    if let Some(Value::Object(map)) = value {
        for (key, raw) in map {
            if let (Ok(season), Some(count)) = (key.trim().parse::<u32>(), parse_count(&raw)) {
                counts.insert(season, count);
            }
        }
    }
    Ok(counts)
}

fn lenient_watched_episodes<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<u32, BTreeSet<u32>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let mut watched = BTreeMap::new();
    if let Some(Value::Object(map)) = value {
        for (key, raw) in map {
            if let Ok(season) = key.trim().parse::<u32>() {
                watched.insert(season, number_set(Some(&raw)));
            }
        }
    }
    Ok(watched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_in_document_shape() {
        let mut state = WatchState::new();
        state.total_seasons = Some(2);
        state.episodes_per_season.insert(1, 3);
        state.watched_episodes.insert(1, [2, 1].into_iter().collect());
        state.watched_seasons.insert(1);

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value,
            json!({
                "totalSeasons": 2,
                "episodesPerSeason": { "1": 3 },
                "watchedEpisodes": { "1": [1, 2] },
                "watchedSeasons": [1],
                "watched": false
            })
        );
    }

    #[test]
    fn test_empty_document_is_default_state() {
        let state: WatchState = serde_json::from_value(json!({})).unwrap();
        assert_eq!(state, WatchState::default());
    }

    #[test]
    fn test_legacy_values_are_parsed_leniently() {
        let state: WatchState = serde_json::from_value(json!({
            "totalSeasons": "4",
            "episodesPerSeason": { "1": "10", "bogus": 3 },
            "watchedEpisodes": { "1": [3, "1", 2] },
            "watchedSeasons": ["1", 2],
            "currentSeason": null
        }))
        .unwrap();

        assert_eq!(state.total_seasons, Some(4));
        assert_eq!(state.episode_count(1), Some(10));
        assert_eq!(state.episodes_per_season.len(), 1);
        assert_eq!(
            state.watched_episodes[&1].iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(state.watched_seasons.len(), 2);
        assert_eq!(state.current_season, None);
    }

    #[test]
    fn test_unparseable_total_seasons_is_unknown() {
        let state: WatchState = serde_json::from_value(json!({ "totalSeasons": "N/A" })).unwrap();
        assert_eq!(state.total_seasons, None);
        let state: WatchState = serde_json::from_value(json!({ "totalSeasons": -3 })).unwrap();
        assert_eq!(state.total_seasons, None);
    }

    #[test]
    fn test_sanitize_removes_invalid_entries() {
        let mut state = WatchState::new();
        state.total_seasons = Some(2);
        state.episodes_per_season.insert(1, 2);
        state.episodes_per_season.insert(5, 8);
        state.watched_episodes.insert(0, [1].into_iter().collect());
        state.watched_episodes.insert(1, [0, 1, 2, 7].into_iter().collect());
        state.watched_episodes.insert(2, BTreeSet::new());
        state.watched_seasons.insert(0);

        assert!(state.sanitize());
        assert_eq!(state.episodes_per_season.len(), 1);
        assert_eq!(state.watched_episodes.len(), 1);
        assert_eq!(state.watched_in_season(1), 2);
        assert!(state.watched_seasons.is_empty());

        // Already clean
        assert!(!state.sanitize());
    }

    #[test]
    fn test_derived_watched_seasons_requires_known_bound() {
        let mut state = WatchState::new();
        state.episodes_per_season.insert(1, 2);
        state.watched_episodes.insert(1, [1, 2].into_iter().collect());
        state.watched_episodes.insert(2, [1, 2, 3].into_iter().collect());

        let derived = state.derived_watched_seasons();
        assert!(derived.contains(&1));
        assert!(!derived.contains(&2));
        assert_eq!(state.latest_watched_in_season(2), Some(3));
    }
}
