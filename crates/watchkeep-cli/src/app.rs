use async_trait::async_trait;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use watch_state_catalog::{CatalogError, CatalogGateway, TmdbClient};
use watch_state_config::{Config, PathManager};
use watch_state_core::{ImportReconciler, MemoryStore, SnapshotStorage, WatchRecordManager};
use watch_state_models::{CatalogSearchResult, Content, ContentType};

/// Everything a command needs: configuration, the loaded store and the
/// services built on top of it.
pub struct App {
    pub config: Config,
    pub manager: Arc<WatchRecordManager>,
    catalog: Arc<dyn CatalogGateway>,
    store: Arc<MemoryStore>,
    storage: SnapshotStorage,
}

impl App {
    pub fn load(paths: &PathManager) -> Result<Self> {
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

        let storage = SnapshotStorage::new(store_path(&config, paths));
        let snapshot = storage
            .load()
            .map_err(|e| eyre!("Failed to load watch store: {}", e))?;
        let store = Arc::new(snapshot.map(MemoryStore::from_snapshot).unwrap_or_default());

        let catalog: Arc<dyn CatalogGateway> = match TmdbClient::from_config(&config.catalog) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                debug!("Catalog unavailable: {}", e);
                Arc::new(UnconfiguredCatalog(e.to_string()))
            }
        };

        let manager = Arc::new(
            WatchRecordManager::new(store.clone(), catalog.clone())
                .with_catalog_timeout(Duration::from_secs(config.catalog.timeout_seconds)),
        );

        Ok(Self {
            config,
            manager,
            catalog,
            store,
            storage,
        })
    }

    pub fn reconciler(&self) -> ImportReconciler {
        ImportReconciler::new(self.manager.clone(), self.catalog.clone())
            .with_vocabulary(self.config.import.vocabulary())
    }

    /// Write the store back to disk
    pub async fn persist(&self) -> Result<()> {
        let snapshot = self.store.snapshot().await;
        self.storage
            .save(&snapshot)
            .map_err(|e| eyre!("{}", e))
            .wrap_err_with(|| format!("Failed to save watch store to {}", self.storage.path().display()))
    }
}

pub fn store_path(config: &Config, paths: &PathManager) -> PathBuf {
    config
        .storage
        .path
        .clone()
        .unwrap_or_else(|| paths.store_file())
}

/// Stand-in gateway when no api key is configured; every call reports why.
struct UnconfiguredCatalog(String);

#[async_trait]
impl CatalogGateway for UnconfiguredCatalog {
    fn provider_name(&self) -> &str {
        "unconfigured"
    }

    async fn search(
        &self,
        _query: &str,
        _content_type: Option<ContentType>,
        _year: Option<i32>,
    ) -> Result<Vec<CatalogSearchResult>, CatalogError> {
        warn!("Catalog search attempted without a configured catalog");
        Err(CatalogError::NotConfigured(self.0.clone()))
    }

    async fn fetch_details(
        &self,
        _catalog_id: u64,
        _content_type: ContentType,
    ) -> Result<Content, CatalogError> {
        Err(CatalogError::NotConfigured(self.0.clone()))
    }
}
