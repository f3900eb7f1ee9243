pub mod media;
pub mod series_item;
pub mod watch_state;

pub use media::MediaKind;
pub use series_item::{fields, Document, ModelError, SeriesItem};
pub use watch_state::{parse_count, WatchState};
