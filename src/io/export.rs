use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{format_cents, LedgerSnapshot};
use crate::storage::SnapshotStore;

/// Ledger snapshot wrapped with export metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerExport {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: LedgerSnapshot,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a, S> {
    service: &'a LedgerService<S>,
}

impl<'a, S: SnapshotStore> Exporter<'a, S> {
    pub fn new(service: &'a LedgerService<S>) -> Self {
        Self { service }
    }

    /// Export transactions to CSV format, newest first
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self.service.get_transactions().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "date",
            "amount",
            "description",
            "details",
            "category",
            "account_id",
            "type",
        ])?;

        for tx in &transactions {
            let amount = format_cents(tx.amount);
            csv_writer.write_record([
                tx.id.as_str(),
                tx.date.as_str(),
                amount.as_str(),
                tx.description.as_str(),
                tx.details.as_str(),
                tx.category.as_str(),
                tx.account_id.as_str(),
                tx.tx_type.as_str(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }

    /// Export the full ledger as a JSON document
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerExport> {
        let data = self.service.sync().await?;

        let export = LedgerExport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            snapshot: LedgerSnapshot {
                balance: data.balance,
                monthly_spend: data.monthly_spend,
                transactions: data.transactions,
            },
        };

        let json = serde_json::to_string_pretty(&export)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(export)
    }
}
