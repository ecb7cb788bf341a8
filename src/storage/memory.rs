use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use crate::domain::LedgerSnapshot;

use super::SnapshotStore;

/// Keeps the snapshot in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<LedgerSnapshot>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Start from an already persisted snapshot.
    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn current(&self) -> Result<Option<LedgerSnapshot>> {
        self.snapshot
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| anyhow!("Memory store lock poisoned"))
    }
}

impl SnapshotStore for MemoryStore {
    async fn exists(&self) -> Result<bool> {
        Ok(self.current()?.is_some())
    }

    async fn load(&self) -> Result<LedgerSnapshot> {
        self.current()?
            .ok_or_else(|| anyhow!("No ledger snapshot stored"))
    }

    async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        *guard = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
