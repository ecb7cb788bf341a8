// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{Local, Months};
use pocket_ledger::application::LedgerService;
use pocket_ledger::domain::{total_amount, Cents, NewTransaction};
use pocket_ledger::storage::{MemoryStore, SnapshotStore, Storage};
use tempfile::TempDir;

/// Helper to create a test service backed by a JSON file in a temporary directory
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::init(Storage::json(temp_dir.path())).await?;
    Ok((service, temp_dir))
}

/// Helper to create a test service over an in-memory store
pub async fn memory_service() -> Result<LedgerService<MemoryStore>> {
    Ok(LedgerService::init(MemoryStore::default()).await?)
}

/// A `DD.MM.YYYY HH:MM` stamp for today at the given time
pub fn today_at(time: &str) -> String {
    format!("{} {}", Local::now().format("%d.%m.%Y"), time)
}

/// A `DD.MM.YYYY HH:MM` stamp in the previous calendar month
pub fn last_month_at(time: &str) -> String {
    let date = Local::now().date_naive() - Months::new(1);
    format!("{} {}", date.format("%d.%m.%Y"), time)
}

pub fn expense_today(amount: f64) -> NewTransaction {
    NewTransaction::new(amount, today_at("09:00"))
}

/// Assert that the stored balance equals the sum of all transaction amounts
pub async fn assert_balance_consistent<S: SnapshotStore>(
    service: &LedgerService<S>,
) -> Result<Cents> {
    let balance = service.get_balance().await?.balance;
    let transactions = service.get_transactions().await?;
    assert_eq!(
        balance,
        total_amount(&transactions)?,
        "balance must equal the sum of transaction amounts"
    );
    Ok(balance)
}
