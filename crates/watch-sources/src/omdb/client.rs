use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use watch_models::MediaKind;
use crate::error::CatalogError;
use crate::omdb::api::{self, OmdbSeasonResponse, OmdbTitleResponse};
use crate::traits::{CatalogEntry, CatalogLookup};

/// HTTP client for the OMDb catalog.
#[derive(Clone)]
pub struct OmdbClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(concat!("seasonkeeper/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn kind_param(kind: MediaKind) -> Result<&'static str, CatalogError> {
        match kind {
            MediaKind::Series => Ok("series"),
            MediaKind::Movie => Ok("movie"),
            MediaKind::Game => Ok("game"),
            MediaKind::Book => Err(CatalogError::Unsupported("books")),
        }
    }

    async fn get_json<T>(&self, query: &[(&str, String)]) -> Result<T, CatalogError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut params: Vec<(&str, String)> = vec![("apikey", self.api_key.clone())];
        params.extend(query.iter().cloned());

        let response = self.client.get(&self.base_url).query(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Http { status: status.as_u16(), body });
        }

        let text = response.text().await?;
        trace!("OMDb response: {}", text);
        serde_json::from_str(&text).map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CatalogLookup for OmdbClient {
    fn catalog_name(&self) -> &str {
        "omdb"
    }

    async fn lookup(&self, title: &str, kind: MediaKind) -> Result<CatalogEntry, CatalogError> {
        let kind_param = Self::kind_param(kind)?;
        debug!("OMDb lookup: '{}' ({})", title, kind_param);
        let response: OmdbTitleResponse = self
            .get_json(&[("t", title.trim().to_string()), ("type", kind_param.to_string())])
            .await?;
        api::interpret_title(title, response)
    }

    async fn season_episode_count(&self, title: &str, season: u32) -> Result<Option<u32>, CatalogError> {
        debug!("OMDb season lookup: '{}' season {}", title, season);
        let response: OmdbSeasonResponse = self
            .get_json(&[
                ("t", title.trim().to_string()),
                ("type", "series".to_string()),
                ("Season", season.to_string()),
            ])
            .await?;
        api::interpret_season(title, response)
    }
}
