pub mod cleanup;
pub mod config;
pub mod episodes;
pub mod migrate;
pub mod migrate_ui;
pub mod prompts;
pub mod refresh;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use watch_config::{Config, PathManager};
use watch_core::JsonFileStore;
use watch_sources::{CatalogFactoryRegistry, CatalogLookup};

/// Configuration and paths shared by every command.
///
/// The store and the catalog are opened on demand so `config` commands work without either.
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    store_override: Option<PathBuf>,
}

impl AppContext {
    pub fn load(store_override: Option<PathBuf>) -> Result<Self> {
        let paths = PathManager::default();
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

        Ok(Self {
            paths,
            config,
            store_override,
        })
    }

    /// `--store`, then `[store] path`, then the default data directory
    pub fn store_path(&self) -> PathBuf {
        self.store_override
            .clone()
            .or_else(|| self.config.store.path.clone())
            .unwrap_or_else(|| self.paths.library_file())
    }

    pub async fn open_store(&self) -> Result<Arc<JsonFileStore>> {
        let path = self.store_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| eyre!("Failed to create {}: {}", parent.display(), e))?;
        }
        let store = JsonFileStore::open(&path)
            .await
            .map_err(|e| eyre!("Failed to open library {}: {}", path.display(), e))?;
        Ok(Arc::new(store))
    }

    pub fn catalog(&self) -> Result<Arc<dyn CatalogLookup>> {
        CatalogFactoryRegistry::new()
            .create(&self.config.catalog)
            .map_err(|e| eyre!("Catalog is not usable: {}. Run 'seasonkeeper config set-key' first.", e))
    }
}
