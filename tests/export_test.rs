mod common;

use anyhow::Result;
use common::{memory_service, test_service};
use pocket_ledger::domain::NewTransaction;
use pocket_ledger::io::{Exporter, LedgerExport};

#[tokio::test]
async fn test_export_transactions_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service
        .add_transaction(
            NewTransaction::new(1200.0, "01.03.2024 09:00").with_description("Salary"),
        )
        .await?;
    service
        .add_transaction(
            NewTransaction::new(-12.5, "02.03.2024 19:30")
                .with_description("Pizza, large")
                .with_category("food"),
        )
        .await?;

    let mut output = Vec::new();
    let count = Exporter::new(&service)
        .export_transactions_csv(&mut output)
        .await?;
    assert_eq!(count, 2);

    let mut reader = csv::Reader::from_reader(output.as_slice());
    let headers = reader.headers()?.clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["id", "date", "amount", "description", "details", "category", "account_id", "type"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 2);
    // Newest first
    assert_eq!(&rows[0][1], "02.03.2024 19:30");
    assert_eq!(&rows[0][2], "-12.50");
    assert_eq!(&rows[0][3], "Pizza, large");
    assert_eq!(&rows[0][5], "food");
    assert_eq!(&rows[0][7], "payment");
    assert_eq!(&rows[1][2], "1200.00");
    assert_eq!(&rows[1][5], "income");

    Ok(())
}

#[tokio::test]
async fn test_export_empty_ledger_csv() -> Result<()> {
    let service = memory_service().await?;

    let mut output = Vec::new();
    let count = Exporter::new(&service)
        .export_transactions_csv(&mut output)
        .await?;

    assert_eq!(count, 0);
    let text = String::from_utf8(output)?;
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("id,date,amount"));

    Ok(())
}

#[tokio::test]
async fn test_export_full_json() -> Result<()> {
    let service = memory_service().await?;
    service
        .add_transaction(NewTransaction::new(99.99, "01.03.2024 09:00").with_id("tx_a"))
        .await?;

    let mut output = Vec::new();
    let export = Exporter::new(&service).export_full_json(&mut output).await?;
    assert_eq!(export.snapshot.balance, 9999);
    assert_eq!(export.version, env!("CARGO_PKG_VERSION"));

    let json: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(json["balance"], 99.99);
    assert_eq!(json["monthlySpend"], 0.0);
    assert_eq!(json["transactions"][0]["id"], "tx_a");
    assert!(json["exportedAt"].is_string());

    let parsed: LedgerExport = serde_json::from_slice(&output)?;
    assert_eq!(parsed.snapshot, export.snapshot);

    Ok(())
}
