mod common;

use anyhow::Result;
use common::{expense_today, test_service};
use pocket_ledger::application::{AppError, LedgerService};
use pocket_ledger::domain::{LedgerSnapshot, NewTransaction};
use pocket_ledger::storage::{JsonFileStore, MemoryStore, SnapshotStore, Storage, SNAPSHOT_FILE};
use tempfile::TempDir;

#[tokio::test]
async fn test_first_run_creates_empty_ledger_file() -> Result<()> {
    let (_service, temp) = test_service().await?;

    let path = temp.path().join(SNAPSHOT_FILE);
    assert!(path.exists());

    let raw = std::fs::read_to_string(&path)?;
    let json: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(json["balance"], 0.0);
    assert_eq!(json["monthlySpend"], 0.0);
    assert_eq!(json["transactions"], serde_json::json!([]));
    // Pretty-printed
    assert!(raw.contains('\n'));

    Ok(())
}

#[tokio::test]
async fn test_init_keeps_existing_ledger() -> Result<()> {
    let (service, temp) = test_service().await?;
    service.update_balance(12.5, None).await?;

    let reopened = LedgerService::init(Storage::json(temp.path())).await?;
    assert!(!reopened.ensure_initialized().await?);
    assert_eq!(reopened.get_balance().await?.balance, 1250);

    Ok(())
}

#[tokio::test]
async fn test_snapshot_file_layout() -> Result<()> {
    let (service, temp) = test_service().await?;
    service
        .add_transaction(
            NewTransaction::new(-12.34, "05.03.2024 18:30")
                .with_id("tx_fixed")
                .with_description("Groceries")
                .with_category("food"),
        )
        .await?;

    let raw = std::fs::read_to_string(temp.path().join(SNAPSHOT_FILE))?;
    let json: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(json["balance"], -12.34);

    let tx = &json["transactions"][0];
    assert_eq!(tx["id"], "tx_fixed");
    assert_eq!(tx["amount"], -12.34);
    assert_eq!(tx["date"], "05.03.2024 18:30");
    assert_eq!(tx["description"], "Groceries");
    assert_eq!(tx["details"], "");
    assert_eq!(tx["category"], "food");
    assert_eq!(tx["accountId"], "acc_chk");
    assert_eq!(tx["type"], "payment");

    Ok(())
}

#[tokio::test]
async fn test_changes_survive_reopen() -> Result<()> {
    let temp = TempDir::new()?;
    let first = LedgerService::init(Storage::json(temp.path())).await?;
    let added = first.add_transaction(expense_today(-7.5)).await?;
    drop(first);

    let second = LedgerService::init(Storage::json(temp.path())).await?;
    let transactions = second.get_transactions().await?;
    assert_eq!(transactions, vec![added.transaction]);
    assert_eq!(second.get_balance().await?.monthly_spend, 750);

    Ok(())
}

#[tokio::test]
async fn test_corrupted_file_is_a_persistence_error() -> Result<()> {
    let temp = TempDir::new()?;
    std::fs::write(temp.path().join(SNAPSHOT_FILE), "{ not json")?;

    let service = LedgerService::init(Storage::json(temp.path())).await?;

    let read = service.get_balance().await;
    assert!(matches!(read, Err(AppError::Persistence(_))));

    let write = service.add_transaction(expense_today(-1.0)).await;
    assert!(matches!(write, Err(AppError::Persistence(_))));

    // The broken file is left in place rather than replaced by an empty ledger
    let raw = std::fs::read_to_string(temp.path().join(SNAPSHOT_FILE))?;
    assert_eq!(raw, "{ not json");

    Ok(())
}

#[tokio::test]
async fn test_missing_fields_fall_back_to_defaults() -> Result<()> {
    let temp = TempDir::new()?;
    std::fs::write(
        temp.path().join(SNAPSHOT_FILE),
        r#"{"balance": 10, "monthlySpend": 0, "transactions": [{"id": "a", "amount": 10, "date": "01.01.2024 10:00"}]}"#,
    )?;

    let store = JsonFileStore::new(temp.path());
    let snapshot = store.load().await?;
    assert_eq!(snapshot.balance, 1000);
    assert_eq!(snapshot.transactions[0].description, "");
    assert_eq!(snapshot.transactions[0].category, "");

    Ok(())
}

#[tokio::test]
async fn test_json_store_creates_missing_directory() -> Result<()> {
    let temp = TempDir::new()?;
    let store = JsonFileStore::new(temp.path().join("nested").join("data"));

    assert!(!store.exists().await?);
    store.save(&LedgerSnapshot::default()).await?;
    assert!(store.exists().await?);
    assert_eq!(store.load().await?, LedgerSnapshot::default());

    Ok(())
}

#[tokio::test]
async fn test_sqlite_backend() -> Result<()> {
    let temp = TempDir::new()?;
    let service = LedgerService::init(Storage::sqlite(temp.path()).await?).await?;
    assert!(temp.path().join("ledger.db").exists());

    service
        .add_transaction(NewTransaction::new(250.0, "01.01.2024 10:00"))
        .await?;
    let expense = service.add_transaction(expense_today(-19.99)).await?;
    service
        .update_transaction(
            &expense.transaction.id,
            pocket_ledger::domain::TransactionUpdate::amount(-20.0),
        )
        .await?;
    drop(service);

    let reopened = LedgerService::init(Storage::sqlite(temp.path()).await?).await?;
    let summary = reopened.get_balance().await?;
    assert_eq!(summary.balance, 23000);
    assert_eq!(summary.monthly_spend, 2000);
    assert_eq!(reopened.get_transactions().await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_memory_store_counts_saves() -> Result<()> {
    let store = MemoryStore::default();
    assert!(!store.exists().await?);
    assert!(store.load().await.is_err());

    store.save(&LedgerSnapshot::default()).await?;
    assert!(store.exists().await?);
    assert_eq!(store.save_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_storage_location() -> Result<()> {
    let temp = TempDir::new()?;
    let storage = Storage::json(temp.path());
    assert!(storage.location().ends_with(SNAPSHOT_FILE));

    Ok(())
}

#[tokio::test]
async fn test_out_of_range_amount_is_a_persistence_error() -> Result<()> {
    let temp = TempDir::new()?;
    std::fs::write(
        temp.path().join(SNAPSHOT_FILE),
        r#"{"balance": 0, "monthlySpend": 0, "transactions": [{"id": "a", "amount": -1e300, "date": "01.01.2024 10:00"}]}"#,
    )?;

    let service = LedgerService::init(Storage::json(temp.path())).await?;

    let stats = service.get_stats().await;
    assert!(matches!(stats, Err(AppError::Persistence(_))));

    let write = service.add_transaction(expense_today(-1.0)).await;
    assert!(matches!(write, Err(AppError::Persistence(_))));

    Ok(())
}

#[tokio::test]
async fn test_snapshot_removed_after_init() -> Result<()> {
    let (service, temp) = test_service().await?;
    service.add_transaction(expense_today(-5.0)).await?;
    std::fs::remove_file(temp.path().join(SNAPSHOT_FILE))?;

    // Reads see an empty ledger
    assert_eq!(service.get_balance().await?.balance, 0);
    assert!(service.get_transactions().await?.is_empty());

    // Mutations refuse to start a new ledger behind the user's back
    let add = service.add_transaction(expense_today(-1.0)).await;
    assert!(matches!(add, Err(AppError::Persistence(_))));
    let set = service.update_balance(10.0, None).await;
    assert!(matches!(set, Err(AppError::Persistence(_))));
    let reconcile = service.reconcile().await;
    assert!(matches!(reconcile, Err(AppError::Persistence(_))));
    assert!(!temp.path().join(SNAPSHOT_FILE).exists());

    // Explicit initialization recreates it
    assert!(service.ensure_initialized().await?);
    service.add_transaction(expense_today(-1.0)).await?;
    assert_eq!(service.get_balance().await?.balance, -100);

    Ok(())
}
