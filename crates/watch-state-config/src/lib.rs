pub mod config;
pub mod paths;

pub use config::{CatalogConfig, Config, ImportConfig, StatusVocabulary, StorageConfig, default_status_vocabulary};
pub use paths::{PathManager, container_base_path};
