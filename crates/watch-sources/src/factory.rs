/// Catalog factory pattern for creating the catalog client from configuration
///
/// Keeps provider selection in one place so the CLI and tests do not need to know
/// which concrete client backs `CatalogLookup`.

use anyhow::Result;
use std::sync::Arc;
use watch_config::CatalogConfig;
use crate::error::CatalogError;
use crate::omdb::OmdbClient;
use crate::traits::CatalogLookup;

/// Factory trait for creating a catalog from configuration
pub trait CatalogFactory: Send + Sync {
    /// The provider name this factory answers to
    fn provider_name(&self) -> &str;

    fn create_catalog(&self, config: &CatalogConfig) -> Result<Arc<dyn CatalogLookup>>;

    fn validate_config(&self, config: &CatalogConfig) -> Result<()>;
}

/// Registry of catalog factories
pub struct CatalogFactoryRegistry {
    factories: std::collections::HashMap<String, Box<dyn CatalogFactory>>,
}

impl CatalogFactoryRegistry {
    /// Create a new registry with all built-in factories registered
    pub fn new() -> Self {
        let mut registry = Self {
            factories: std::collections::HashMap::new(),
        };
        registry.register(Box::new(OmdbCatalogFactory));
        registry
    }

    pub fn register(&mut self, factory: Box<dyn CatalogFactory>) {
        self.factories.insert(factory.provider_name().to_string(), factory);
    }

    /// Create the catalog named by `config.provider`
    pub fn create(&self, config: &CatalogConfig) -> Result<Arc<dyn CatalogLookup>> {
        let name = config.provider.trim().to_lowercase();
        let factory = self
            .factories
            .get(&name)
            .ok_or_else(|| anyhow::anyhow!("Unknown catalog provider: {}", config.provider))?;
        factory.validate_config(config)?;
        factory.create_catalog(config)
    }
}

impl Default for CatalogFactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OmdbCatalogFactory;

impl CatalogFactory for OmdbCatalogFactory {
    fn provider_name(&self) -> &str {
        "omdb"
    }

    fn create_catalog(&self, config: &CatalogConfig) -> Result<Arc<dyn CatalogLookup>> {
        let api_key = config.resolved_api_key().ok_or(CatalogError::MissingApiKey)?;
        let client = OmdbClient::new(config.base_url.clone(), api_key, config.timeout())?;
        Ok(Arc::new(client))
    }

    fn validate_config(&self, config: &CatalogConfig) -> Result<()> {
        if config.resolved_api_key().is_none() {
            return Err(anyhow::anyhow!(
                "OMDb is selected but no API key is set (config catalog.api_key or ${})",
                watch_config::OMDB_API_KEY_ENV
            ));
        }
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!("catalog.base_url must be an http(s) URL"));
        }
        Ok(())
    }
}
