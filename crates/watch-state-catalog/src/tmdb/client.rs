use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use watch_state_config::CatalogConfig;
use watch_state_models::{CatalogSearchResult, Content, ContentType};
use crate::error::CatalogError;
use crate::tmdb::api::{self, TmdbAuth, DEFAULT_BASE_URL};
use crate::traits::CatalogGateway;

#[derive(Clone)]
pub struct TmdbClient {
    client: Arc<Client>,
    auth: TmdbAuth,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Self {
        Self::with_options(api_key, DEFAULT_BASE_URL.to_string(), None, Duration::from_secs(10))
    }

    pub fn with_options(
        api_key: String,
        base_url: String,
        language: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .user_agent(concat!("watchkeep/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client: Arc::new(client),
            auth: TmdbAuth {
                base_url,
                api_key,
                language,
            },
        }
    }

    /// Build a client from the `[catalog]` config section, falling back to
    /// the `TMDB_API_KEY` environment variable for the key.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("TMDB_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CatalogError::NotConfigured(
                    "no TMDB api key (set catalog.api_key or TMDB_API_KEY)".to_string(),
                )
            })?;

        info!("Using TMDB catalog at {}", config.base_url);
        Ok(Self::with_options(
            api_key,
            config.base_url.clone(),
            config.language.clone(),
            Duration::from_secs(config.timeout_seconds),
        ))
    }
}

#[async_trait]
impl CatalogGateway for TmdbClient {
    fn provider_name(&self) -> &str {
        "tmdb"
    }

    async fn search(
        &self,
        query: &str,
        content_type: Option<ContentType>,
        year: Option<i32>,
    ) -> Result<Vec<CatalogSearchResult>, CatalogError> {
        api::search(&self.client, &self.auth, query, content_type, year).await
    }

    async fn fetch_details(
        &self,
        catalog_id: u64,
        content_type: ContentType,
    ) -> Result<Content, CatalogError> {
        api::fetch_details(&self.client, &self.auth, catalog_id, content_type).await
    }
}
