use anyhow::{Context, Result};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use crate::store::StoreSnapshot;

/// On-disk storage for `MemoryStore` snapshots
///
/// Gzip-compressed JSON, written atomically through a temp file.
pub struct SnapshotStorage {
    path: PathBuf,
}

impl SnapshotStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, `None` when there is nothing to load.
    ///
    /// An unreadable snapshot is backed up next to the original and treated as empty.
    pub fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.path.exists() {
            debug!("Snapshot file {:?} does not exist, starting empty", self.path);
            return Ok(None);
        }

        let start = std::time::Instant::now();
        let data = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read snapshot {:?}", self.path))?;

        let mut decoded = Vec::new();
        let parsed = GzDecoder::new(&data[..])
            .read_to_end(&mut decoded)
            .map_err(anyhow::Error::from)
            .and_then(|_| serde_json::from_slice::<StoreSnapshot>(&decoded).map_err(anyhow::Error::from));

        match parsed {
            Ok(snapshot) => {
                info!(
                    "Loaded snapshot: {} records, {} activity entries in {:?}",
                    snapshot.records.len(),
                    snapshot.activity.len(),
                    start.elapsed()
                );
                Ok(Some(snapshot))
            }
            Err(e) => {
                let backup_path = self.backup_path();
                if let Err(backup_err) = std::fs::copy(&self.path, &backup_path) {
                    warn!(
                        "Failed to back up unreadable snapshot: {}. Starting with an empty store.",
                        backup_err
                    );
                } else {
                    warn!(
                        "Snapshot unreadable ({}). Backed up to {:?} and starting with an empty store.",
                        e, backup_path
                    );
                }
                Ok(None)
            }
        }
    }

    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let start = std::time::Instant::now();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let serialized = serde_json::to_vec(snapshot)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&serialized)?;
        let encoded = encoder.finish()?;

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, encoded)
            .with_context(|| format!("Failed to write snapshot {:?}", temp_path))?;
        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to move snapshot into place at {:?}", self.path))?;

        info!(
            "Saved snapshot: {} records in {:?}",
            snapshot.records.len(),
            start.elapsed()
        );
        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".bak");
        self.path.with_file_name(name)
    }
}
