//! Persistence backends for the ledger snapshot.
//!
//! Every backend stores exactly one [`LedgerSnapshot`] and replaces it whole
//! on each save. The ledger service never keeps state between calls, so a
//! backend is the single source of truth.

mod json_file;
mod memory;
mod sqlite;

use std::future::Future;
use std::path::Path;

use anyhow::Result;

use crate::domain::LedgerSnapshot;

pub use json_file::*;
pub use memory::*;
pub use sqlite::*;

/// SQL migration for the snapshot table
pub const MIGRATION_001_SNAPSHOT: &str = include_str!("migrations/001_snapshot.sql");

/// Load/save contract consumed by the ledger service.
pub trait SnapshotStore: Send + Sync {
    /// Whether a snapshot has been persisted yet.
    fn exists(&self) -> impl Future<Output = Result<bool>> + Send;

    /// Read the persisted snapshot. Fails if none exists or it cannot be decoded.
    fn load(&self) -> impl Future<Output = Result<LedgerSnapshot>> + Send;

    /// Replace the persisted snapshot.
    fn save(&self, snapshot: &LedgerSnapshot) -> impl Future<Output = Result<()>> + Send;
}

/// Runtime-selected backend.
pub enum Storage {
    JsonFile(JsonFileStore),
    Sqlite(SqliteStore),
}

impl Storage {
    /// JSON file backend rooted at `data_dir`.
    pub fn json(data_dir: impl AsRef<Path>) -> Self {
        Storage::JsonFile(JsonFileStore::new(data_dir))
    }

    /// SQLite backend rooted at `data_dir`. Creates the database if needed.
    pub async fn sqlite(data_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Storage::Sqlite(SqliteStore::open(data_dir).await?))
    }

    /// Human-readable location of the data, for log and CLI messages.
    pub fn location(&self) -> String {
        match self {
            Storage::JsonFile(store) => store.path().display().to_string(),
            Storage::Sqlite(store) => store.path().display().to_string(),
        }
    }
}

impl SnapshotStore for Storage {
    async fn exists(&self) -> Result<bool> {
        match self {
            Storage::JsonFile(store) => store.exists().await,
            Storage::Sqlite(store) => store.exists().await,
        }
    }

    async fn load(&self) -> Result<LedgerSnapshot> {
        match self {
            Storage::JsonFile(store) => store.load().await,
            Storage::Sqlite(store) => store.load().await,
        }
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        match self {
            Storage::JsonFile(store) => store.save(snapshot).await,
            Storage::Sqlite(store) => store.save(snapshot).await,
        }
    }
}
