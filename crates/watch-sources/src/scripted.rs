use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use watch_models::MediaKind;
use crate::error::CatalogError;
use crate::traits::{CatalogEntry, CatalogLookup};

/// One recorded catalog request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    Lookup { title: String, kind: MediaKind },
    Season { title: String, season: u32 },
}

#[derive(Debug, Clone)]
enum Scripted {
    Seasons(Option<u32>),
    Fail(String),
}

/// In-memory catalog with canned answers, for tests and offline runs.
///
/// Titles without a script answer `NotFound`. Every request is recorded in order.
#[derive(Default)]
pub struct ScriptedCatalog {
    titles: HashMap<String, Scripted>,
    seasons: HashMap<(String, u32), u32>,
    calls: Mutex<Vec<CatalogCall>>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(title: &str) -> String {
        title.trim().to_lowercase()
    }

    pub fn with_seasons(mut self, title: &str, total_seasons: u32) -> Self {
        self.titles.insert(Self::key(title), Scripted::Seasons(Some(total_seasons)));
        self
    }

    /// The title exists but the catalog has no season count for it
    pub fn without_seasons(mut self, title: &str) -> Self {
        self.titles.insert(Self::key(title), Scripted::Seasons(None));
        self
    }

    pub fn failing(mut self, title: &str, message: &str) -> Self {
        self.titles.insert(Self::key(title), Scripted::Fail(message.to_string()));
        self
    }

    pub fn with_season_episodes(mut self, title: &str, season: u32, episodes: u32) -> Self {
        self.seasons.insert((Self::key(title), season), episodes);
        self
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn record(&self, call: CatalogCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl CatalogLookup for ScriptedCatalog {
    fn catalog_name(&self) -> &str {
        "scripted"
    }

    async fn lookup(&self, title: &str, kind: MediaKind) -> Result<CatalogEntry, CatalogError> {
        self.record(CatalogCall::Lookup { title: title.to_string(), kind });
        match self.titles.get(&Self::key(title)) {
            Some(Scripted::Seasons(Some(n))) => Ok(CatalogEntry::with_seasons(*n)),
            Some(Scripted::Seasons(None)) => Ok(CatalogEntry::default()),
            Some(Scripted::Fail(message)) => Err(CatalogError::Transport(message.clone())),
            None => Err(CatalogError::not_found(title)),
        }
    }

    async fn season_episode_count(&self, title: &str, season: u32) -> Result<Option<u32>, CatalogError> {
        self.record(CatalogCall::Season { title: title.to_string(), season });
        if let Some(Scripted::Fail(message)) = self.titles.get(&Self::key(title)) {
            return Err(CatalogError::Transport(message.clone()));
        }
        Ok(self.seasons.get(&(Self::key(title), season)).copied())
    }
}
