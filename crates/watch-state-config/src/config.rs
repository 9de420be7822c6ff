use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use watch_state_models::WatchedStatus;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// TMDB v3 api key or v4 read access token (TMDB_API_KEY env var is used when unset)
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImportConfig {
    /// Maximum number of entries reconciled at once
    #[serde(default = "default_import_concurrency")]
    pub concurrency: usize,
    /// Extra source-state → status entries, added on top of the defaults
    #[serde(default)]
    pub status_mapping: HashMap<String, WatchedStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// Snapshot file; defaults to the data dir
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_provider() -> String {
    "tmdb".to_string()
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_import_concurrency() -> usize {
    4
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            base_url: default_base_url(),
            language: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            concurrency: default_import_concurrency(),
            status_mapping: HashMap::new(),
        }
    }
}

impl ImportConfig {
    /// Default vocabulary plus configured extras. Built-in states keep their status.
    pub fn vocabulary(&self) -> StatusVocabulary {
        let mut vocabulary = default_status_vocabulary();
        for (state, status) in &self.status_mapping {
            if vocabulary.lookup(state).is_none() {
                vocabulary.insert(state, *status);
            }
        }
        vocabulary
    }
}

/// Maps status strings from imported lists onto `WatchedStatus`.
///
/// Lookups ignore case and surrounding whitespace. Anything unknown maps to
/// `Planned`.
#[derive(Debug, Clone)]
pub struct StatusVocabulary {
    to_status: HashMap<String, WatchedStatus>,
}

impl StatusVocabulary {
    fn normalize(state: &str) -> String {
        state.trim().to_lowercase().replace(['_', '-'], " ")
    }

    pub fn insert(&mut self, state: &str, status: WatchedStatus) {
        self.to_status.insert(Self::normalize(state), status);
    }

    pub fn lookup(&self, state: &str) -> Option<WatchedStatus> {
        self.to_status.get(&Self::normalize(state)).copied()
    }

    pub fn map_state(&self, state: Option<&str>) -> WatchedStatus {
        state
            .and_then(|s| self.lookup(s))
            .unwrap_or(WatchedStatus::Planned)
    }
}

pub fn default_status_vocabulary() -> StatusVocabulary {
    use watch_state_models::WatchedStatus::*;

    let mut vocabulary = StatusVocabulary { to_status: HashMap::new() };
    for state in ["planned", "plan", "plan to watch", "plantowatch", "want to watch", "watchlist", "to watch"] {
        vocabulary.insert(state, Planned);
    }
    for state in ["watching", "in progress", "currently watching", "checkins"] {
        vocabulary.insert(state, Watching);
    }
    for state in ["finished", "watched", "completed", "complete", "seen", "done"] {
        vocabulary.insert(state, Finished);
    }
    for state in ["hold", "on hold", "paused"] {
        vocabulary.insert(state, Hold);
    }
    for state in ["dropped", "abandoned", "stopped"] {
        vocabulary.insert(state, Dropped);
    }
    vocabulary
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Missing file means defaults
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.catalog.provider != "tmdb" {
            return Err(anyhow::anyhow!("Unsupported catalog provider: {}", self.catalog.provider));
        }
        if self.catalog.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("catalog.timeout_seconds must be greater than zero"));
        }
        if self.catalog.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("catalog.base_url cannot be empty"));
        }
        if self.import.concurrency == 0 {
            return Err(anyhow::anyhow!("import.concurrency must be at least 1"));
        }
        if self.import.status_mapping.keys().any(|k| k.trim().is_empty()) {
            return Err(anyhow::anyhow!("import.status_mapping cannot contain empty states"));
        }
        Ok(())
    }

    pub fn is_catalog_configured(&self) -> bool {
        self.catalog
            .api_key
            .as_ref()
            .map(|k| !k.trim().is_empty() && k != "YOUR_API_KEY")
            .unwrap_or(false)
    }
}
