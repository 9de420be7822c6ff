use anyhow::Result;
use std::path::{Path, PathBuf};

/// Get the container base path from environment variable, defaulting to "/app"
pub fn container_base_path() -> PathBuf {
    std::env::var("WATCHKEEP_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("watchkeep");

        Ok(Self::rooted_at(base_dir))
    }

    /// Config files at `base`, data and logs in subdirectories
    pub fn rooted_at(base: PathBuf) -> Self {
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn from_docker_env() -> Self {
        Self::rooted_at(container_base_path())
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Default location of the persisted watch store snapshot
    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join("watchkeep.json.gz")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("watchkeep.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // An explicit base path wins, then the container layout, then the
        // platform config dir (e.g. ~/.config/watchkeep on Linux)
        if std::env::var("WATCHKEEP_BASE_PATH").is_ok() {
            return Self::from_docker_env();
        }
        let base = container_base_path();
        if base.exists() {
            return Self::from_docker_env();
        }
        Self::new().unwrap_or_else(|_| Self::from_docker_env())
    }
}
