use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of tracked item. Only `Series` carries season/episode progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
    Game,
    Book,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
            MediaKind::Game => "game",
            MediaKind::Book => "book",
        }
    }

    pub fn has_episodes(&self) -> bool {
        matches!(self, MediaKind::Series)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
