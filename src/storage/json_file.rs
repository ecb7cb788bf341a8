use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::debug;

use crate::domain::LedgerSnapshot;

use super::SnapshotStore;

/// File name of the snapshot inside the data directory.
pub const SNAPSHOT_FILE: &str = "ledger.json";

/// Stores the snapshot as pretty-printed JSON in a single file.
/// Saves go through a temporary file and a rename, so readers never see a
/// partially written snapshot.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store `ledger.json` inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::at(data_dir.as_ref().join(SNAPSHOT_FILE))
    }

    /// Store the snapshot at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileStore {
    async fn exists(&self) -> Result<bool> {
        fs::try_exists(&self.path)
            .await
            .with_context(|| format!("Failed to access {}", self.path.display()))
    }

    async fn load(&self) -> Result<LedgerSnapshot> {
        let json = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid ledger snapshot in {}", self.path.display()))
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(snapshot).context("Failed to encode snapshot")?;
        let temp = self.temp_path();
        fs::write(&temp, json)
            .await
            .with_context(|| format!("Failed to write {}", temp.display()))?;
        fs::rename(&temp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Saved ledger snapshot");
        Ok(())
    }
}
