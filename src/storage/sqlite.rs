use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::LedgerSnapshot;

use super::{SnapshotStore, MIGRATION_001_SNAPSHOT};

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "ledger.db";

/// Stores the snapshot as a JSON document in a single SQLite row.
pub struct SqliteStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool, path: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            path: path.into(),
        }
    }

    /// Open (creating if needed) `ledger.db` inside `data_dir` and run migrations.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let path = data_dir.join(DATABASE_FILE);
        let db_url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&db_url)
            .await
            .context("Failed to connect to database")?;

        let store = Self::new(pool, path);
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_SNAPSHOT)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for SqliteStore {
    async fn exists(&self) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ledger_snapshot")
            .fetch_one(&self.pool)
            .await
            .context("Failed to query snapshot")?;
        Ok(count > 0)
    }

    async fn load(&self) -> Result<LedgerSnapshot> {
        let row = sqlx::query("SELECT body FROM ledger_snapshot WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch snapshot")?
            .ok_or_else(|| anyhow::anyhow!("No ledger snapshot stored"))?;

        let body: String = row.get("body");
        serde_json::from_str(&body).context("Invalid ledger snapshot in database")
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let body = serde_json::to_string_pretty(snapshot).context("Failed to encode snapshot")?;

        sqlx::query(
            r#"
            INSERT INTO ledger_snapshot (id, body, updated_at)
            VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at
            "#,
        )
        .bind(body)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save snapshot")?;

        debug!(path = %self.path.display(), "Saved ledger snapshot");
        Ok(())
    }
}
