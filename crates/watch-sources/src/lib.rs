pub mod error;
pub mod factory;
pub mod omdb;
pub mod progress;
pub mod scripted;
pub mod traits;

pub use error::CatalogError;
pub use factory::{CatalogFactory, CatalogFactoryRegistry};
pub use omdb::OmdbClient;
pub use progress::ProgressTracker;
pub use scripted::{CatalogCall, ScriptedCatalog};
pub use traits::{CatalogEntry, CatalogLookup};
