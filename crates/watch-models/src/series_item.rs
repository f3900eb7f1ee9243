use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::media::MediaKind;
use crate::watch_state::WatchState;

/// Raw document fields as held by a document store.
pub type Document = Map<String, Value>;

/// Field names of the persisted item document.
pub mod fields {
    pub const USER_ID: &str = "userId";
    pub const TITLE: &str = "title";
    pub const KIND: &str = "type";
    pub const TOTAL_SEASONS: &str = "totalSeasons";
    pub const EPISODES_PER_SEASON: &str = "episodesPerSeason";
    pub const WATCHED_EPISODES: &str = "watchedEpisodes";
    pub const WATCHED_SEASONS: &str = "watchedSeasons";
    pub const CURRENT_SEASON: &str = "currentSeason";
    pub const CURRENT_EPISODE: &str = "currentEpisode";
    pub const WATCHED: &str = "watched";

    /// Dotted path addressing one season entry inside a season-keyed map field.
    pub fn season_path(field: &str, season: u32) -> String {
        format!("{}.{}", field, season)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("document {id} is not a valid item: {source}")]
    InvalidDocument {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("item {id} is a {kind}, not a series")]
    NotASeries { id: String, kind: MediaKind },
}

/// A tracked item together with its watch state.
///
/// The watch state fields live flat on the same document as the item metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesItem {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(flatten)]
    pub state: WatchState,
}

impl SeriesItem {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            title: title.into(),
            kind: MediaKind::Series,
            state: WatchState::new(),
        }
    }

    pub fn with_state(mut self, state: WatchState) -> Self {
        self.state = state;
        self
    }

    pub fn from_document(id: &str, document: &Document) -> Result<Self, ModelError> {
        let mut item: SeriesItem = serde_json::from_value(Value::Object(document.clone()))
            .map_err(|source| ModelError::InvalidDocument { id: id.to_string(), source })?;
        item.id = id.to_string();
        Ok(item)
    }

    /// Like `from_document` but rejects non-series items.
    pub fn series_from_document(id: &str, document: &Document) -> Result<Self, ModelError> {
        let item = Self::from_document(id, document)?;
        if !item.kind.has_episodes() {
            return Err(ModelError::NotASeries { id: id.to_string(), kind: item.kind });
        }
        Ok(item)
    }

    pub fn to_document(&self) -> Document {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Document::new(),
        }
    }

    /// Title to use for catalog lookups and display.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}
