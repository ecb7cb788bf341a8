use anyhow::anyhow;
use chrono::{Local, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{
    add_cents, build_integrity_report, format_cents, generate_transaction_id, sub_cents,
    to_cents, total, BalanceSummary, Cents, IntegrityReport, LedgerSnapshot, LedgerStats,
    NewTransaction, Transaction, TransactionUpdate, MAX_AMOUNT,
};
use crate::storage::{SnapshotStore, Storage};

use super::AppError;

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, HTTP server, exporters).
///
/// Every operation reads the whole snapshot from the store; mutations write
/// it back whole. Mutations within one process are serialized.
pub struct LedgerService<S = Storage> {
    store: S,
    write_lock: Mutex<()>,
}

/// Result of adding, updating or deleting a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub transaction: Transaction,
    pub balance: Cents,
    pub monthly_spend: Cents,
}

/// Full ledger contents plus the time it was read
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncData {
    #[serde(with = "total")]
    pub balance: Cents,
    #[serde(with = "total")]
    pub monthly_spend: Cents,
    pub transactions: Vec<Transaction>,
    pub last_update: String,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Validate a raw amount and round it to cents.
fn checked_cents(value: f64, field: &str) -> Result<Cents, AppError> {
    if !value.is_finite() {
        return Err(AppError::validation(format!("Invalid {} format", field)));
    }
    if value.abs() >= MAX_AMOUNT {
        return Err(AppError::validation(format!("{} is out of range", field)));
    }
    Ok(to_cents(value))
}

impl TransactionOutcome {
    fn new(transaction: Transaction, snapshot: &LedgerSnapshot) -> Self {
        Self {
            transaction,
            balance: snapshot.balance,
            monthly_spend: snapshot.monthly_spend,
        }
    }
}

impl<S: SnapshotStore> LedgerService<S> {
    /// Create a new ledger service over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Create the service and persist an empty ledger if none exists yet.
    pub async fn init(store: S) -> Result<Self, AppError> {
        let service = Self::new(store);
        service.ensure_initialized().await?;
        Ok(service)
    }

    /// Persist the empty ledger on first run. Returns true if it was created.
    pub async fn ensure_initialized(&self) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        if self.store.exists().await? {
            return Ok(false);
        }

        self.store.save(&LedgerSnapshot::default()).await?;
        info!("Created empty ledger");
        Ok(true)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the persisted snapshot. An absent snapshot reads as the empty ledger;
    /// any other read failure is returned as is.
    async fn read_snapshot(&self) -> Result<LedgerSnapshot, AppError> {
        if !self.store.exists().await? {
            return Ok(LedgerSnapshot::default());
        }
        Ok(self.store.load().await?)
    }

    /// Read the snapshot a mutation will rewrite. Only `ensure_initialized`
    /// may create a ledger, so an absent snapshot is a storage failure here.
    async fn snapshot_for_update(&self) -> Result<LedgerSnapshot, AppError> {
        if !self.store.exists().await? {
            return Err(anyhow!("Ledger snapshot is missing").into());
        }
        Ok(self.store.load().await?)
    }

    // ========================
    // Balance operations
    // ========================

    /// Current balance and monthly spend.
    pub async fn get_balance(&self) -> Result<BalanceSummary, AppError> {
        Ok(self.read_snapshot().await?.summary())
    }

    /// Overwrite the balance, and the monthly spend if given.
    /// This is a manual correction: the monthly spend stays as set until the
    /// next transaction mutation recomputes it.
    pub async fn update_balance(
        &self,
        balance: f64,
        monthly_spend: Option<f64>,
    ) -> Result<BalanceSummary, AppError> {
        let balance = checked_cents(balance, "balance")?;
        let monthly_spend = monthly_spend
            .map(|value| checked_cents(value, "monthly spend"))
            .transpose()?;

        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.snapshot_for_update().await?;

        snapshot.balance = balance;
        if let Some(monthly_spend) = monthly_spend {
            snapshot.monthly_spend = monthly_spend;
        }
        self.store.save(&snapshot).await?;

        info!(
            balance = %format_cents(snapshot.balance),
            monthly_spend = %format_cents(snapshot.monthly_spend),
            "Balance overridden"
        );
        Ok(snapshot.summary())
    }

    // ========================
    // Transaction operations
    // ========================

    /// All transactions, newest first.
    pub async fn get_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        Ok(self.read_snapshot().await?.transactions)
    }

    /// Record a new transaction at the front of the list.
    pub async fn add_transaction(
        &self,
        mut input: NewTransaction,
    ) -> Result<TransactionOutcome, AppError> {
        let amount = checked_cents(input.amount, "amount")?;
        if input.date.trim().is_empty() {
            return Err(AppError::validation("Date is required"));
        }

        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.snapshot_for_update().await?;

        let id = match input.id.take().filter(|id| !id.is_empty()) {
            Some(id) if snapshot.contains(&id) => {
                return Err(AppError::validation(format!(
                    "Transaction id already exists: {}",
                    id
                )));
            }
            Some(id) => id,
            None => loop {
                let id = generate_transaction_id();
                if !snapshot.contains(&id) {
                    break id;
                }
            },
        };

        let transaction = Transaction::from_input(id, amount, input);
        snapshot.balance = add_cents(snapshot.balance, amount)?;
        snapshot.transactions.insert(0, transaction.clone());
        snapshot.refresh_monthly_spend(today())?;
        self.store.save(&snapshot).await?;

        info!(
            id = %transaction.id,
            amount = %format_cents(amount),
            balance = %format_cents(snapshot.balance),
            "Recorded transaction"
        );
        Ok(TransactionOutcome::new(transaction, &snapshot))
    }

    /// Apply a partial update. Returns None if no transaction has this id.
    pub async fn update_transaction(
        &self,
        id: &str,
        update: TransactionUpdate,
    ) -> Result<Option<TransactionOutcome>, AppError> {
        let new_amount = update
            .amount
            .map(|value| checked_cents(value, "amount"))
            .transpose()?;

        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.snapshot_for_update().await?;

        let Some(index) = snapshot.position(id) else {
            debug!(id, "Update of unknown transaction");
            return Ok(None);
        };

        if let Some(new_amount) = new_amount {
            let old_amount = snapshot.transactions[index].amount;
            let shifted = add_cents(snapshot.balance, new_amount)?;
            snapshot.balance = sub_cents(shifted, old_amount)?;
        }

        let transaction = &mut snapshot.transactions[index];
        transaction.apply(new_amount, update);
        let transaction = transaction.clone();
        snapshot.refresh_monthly_spend(today())?;
        self.store.save(&snapshot).await?;

        info!(
            id,
            balance = %format_cents(snapshot.balance),
            "Updated transaction"
        );
        Ok(Some(TransactionOutcome::new(transaction, &snapshot)))
    }

    /// Remove a transaction. Returns None if no transaction has this id.
    pub async fn delete_transaction(
        &self,
        id: &str,
    ) -> Result<Option<TransactionOutcome>, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.snapshot_for_update().await?;

        let Some(index) = snapshot.position(id) else {
            debug!(id, "Delete of unknown transaction");
            return Ok(None);
        };

        snapshot.balance = sub_cents(snapshot.balance, snapshot.transactions[index].amount)?;
        let deleted = snapshot.transactions.remove(index);
        snapshot.refresh_monthly_spend(today())?;
        self.store.save(&snapshot).await?;

        info!(
            id,
            amount = %format_cents(deleted.amount),
            balance = %format_cents(snapshot.balance),
            "Deleted transaction"
        );
        Ok(Some(TransactionOutcome::new(deleted, &snapshot)))
    }

    // ========================
    // Reporting operations
    // ========================

    /// Totals computed fresh over the full transaction list.
    pub async fn get_stats(&self) -> Result<LedgerStats, AppError> {
        Ok(self.read_snapshot().await?.stats()?)
    }

    /// Everything a client needs to mirror the ledger.
    pub async fn sync(&self) -> Result<SyncData, AppError> {
        let snapshot = self.read_snapshot().await?;
        Ok(SyncData {
            balance: snapshot.balance,
            monthly_spend: snapshot.monthly_spend,
            transactions: snapshot.transactions,
            last_update: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    // ========================
    // Integrity operations
    // ========================

    /// Compare the stored totals against the transaction list.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let snapshot = self.read_snapshot().await?;
        Ok(build_integrity_report(&snapshot, today())?)
    }

    /// Recompute balance and monthly spend from scratch and persist them.
    pub async fn reconcile(&self) -> Result<BalanceSummary, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.snapshot_for_update().await?;

        let before = snapshot.summary();
        snapshot.recompute(today())?;
        self.store.save(&snapshot).await?;

        info!(
            old_balance = %format_cents(before.balance),
            balance = %format_cents(snapshot.balance),
            monthly_spend = %format_cents(snapshot.monthly_spend),
            "Reconciled ledger"
        );
        Ok(snapshot.summary())
    }
}
