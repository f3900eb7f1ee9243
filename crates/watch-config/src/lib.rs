pub mod config;
pub mod paths;

pub use config::{CatalogConfig, Config, LoggingConfig, MigrationConfig, StoreConfig, OMDB_API_KEY_ENV};
pub use paths::PathManager;
