pub mod backfill;
pub mod migration;
pub mod mutator;
pub mod next_episode;
pub mod patch;
pub mod progress;
pub mod session;
pub mod store;
pub mod tracker;

pub use backfill::{BackfillError, BackfillOutcome, EpisodeCountBackfill};
pub use migration::{
    FailureReason, MigrationDetail, MigrationEngine, MigrationError, MigrationOutcome,
    MigrationProgress, MigrationResult, RefreshResult,
};
pub use mutator::{Mutation, MutationError};
pub use next_episode::{next_episode, NextEpisode};
pub use patch::{FieldPatch, FieldUpdate};
pub use progress::{all_season_progress, calculate_progress, season_progress, Progress, SeasonProgress};
pub use session::{CleanupReport, SessionContext};
pub use store::{DocumentStore, Filter, JsonFileStore, MemoryStore, StoreError, StoredDocument};
pub use tracker::{apply_action, plan_action, ActionOutcome, EpisodeAction, TrackError};
