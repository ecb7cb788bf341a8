use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::application::LedgerService;
use crate::domain::{
    format_cents, format_now, from_cents, parse_cents, Cents, NewTransaction, Transaction,
    TransactionUpdate,
};
use crate::storage::Storage;

/// Pocket Ledger - personal balance and spending tracker
#[derive(Parser)]
#[command(name = "pocket-ledger")]
#[command(about = "A single-user ledger keeping balance and monthly spend in sync with transactions")]
#[command(version)]
pub struct Cli {
    /// Directory holding the ledger data
    #[arg(long, env = "POCKET_LEDGER_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Storage backend
    #[arg(
        long,
        env = "POCKET_LEDGER_STORAGE",
        value_enum,
        default_value_t = StorageKind::Json,
        global = true
    )]
    pub storage: StorageKind,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// Pretty-printed JSON file (ledger.json)
    Json,
    /// SQLite database (ledger.db)
    Sqlite,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the empty ledger if it does not exist yet
    Init,

    /// Serve the JSON API
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "POCKET_LEDGER_LISTEN", default_value = "0.0.0.0:3000")]
        listen: String,
    },

    /// Show balance and monthly spend
    Balance,

    /// Overwrite the balance (manual correction)
    SetBalance {
        /// New balance (e.g., "1250.00")
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Also overwrite the monthly spend
        #[arg(short, long)]
        monthly_spend: Option<String>,
    },

    /// Record a transaction (negative amounts are expenses)
    Add {
        /// Amount (e.g., "-40.00" or "100")
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Date as DD.MM.YYYY HH:MM (defaults to now)
        #[arg(long)]
        date: Option<String>,

        /// Description of the transaction
        #[arg(short, long)]
        description: Option<String>,

        /// Free-form details
        #[arg(long)]
        details: Option<String>,

        /// Category (defaults to income/expense)
        #[arg(short, long)]
        category: Option<String>,

        /// Account id (defaults to acc_chk)
        #[arg(long)]
        account: Option<String>,

        /// Transaction type (defaults to deposit/payment)
        #[arg(short = 't', long = "type")]
        tx_type: Option<String>,
    },

    /// Change fields of an existing transaction
    Update {
        /// Transaction ID
        id: String,

        /// New amount
        #[arg(short, long, allow_hyphen_values = true)]
        amount: Option<String>,

        /// New date (DD.MM.YYYY HH:MM)
        #[arg(long)]
        date: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New details
        #[arg(long)]
        details: Option<String>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        /// New account id
        #[arg(long)]
        account: Option<String>,

        /// New transaction type
        #[arg(short = 't', long = "type")]
        tx_type: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },

    /// List transactions, newest first
    Transactions {
        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show ledger statistics
    Stats,

    /// Verify that stored totals match the transactions
    Check,

    /// Recompute balance and monthly spend from the transactions
    Reconcile,

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions (CSV), full (JSON)
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn parse_amount(input: &str) -> Result<f64> {
    let cents = parse_cents(input)
        .with_context(|| format!("Invalid amount '{}'. Use '50.00' or '-50'", input))?;
    Ok(from_cents(cents))
}

impl Cli {
    /// Install the global tracing subscriber. `RUST_LOG` overrides the defaults.
    pub fn init_tracing(&self) {
        let default = match (&self.command, self.verbose) {
            (_, true) => "debug",
            (Commands::Serve { .. }, false) => "info",
            _ => "warn",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    async fn open_storage(&self) -> Result<Storage> {
        match self.storage {
            StorageKind::Json => Ok(Storage::json(&self.data_dir)),
            StorageKind::Sqlite => Storage::sqlite(&self.data_dir).await,
        }
    }

    async fn open_service(&self) -> Result<LedgerService> {
        let storage = self.open_storage().await?;
        let location = storage.location();
        LedgerService::init(storage)
            .await
            .with_context(|| format!("Failed to open ledger at {}", location))
    }

    pub async fn run(self) -> Result<()> {
        let service = self.open_service().await?;

        match self.command {
            Commands::Init => {
                println!("Ledger ready: {}", service.store().location());
            }

            Commands::Serve { listen } => {
                crate::server::serve(service, &listen).await?;
            }

            Commands::Balance => {
                let summary = service.get_balance().await?;
                println!("Balance:       {:>12}", format_cents(summary.balance));
                println!("Monthly spend: {:>12}", format_cents(summary.monthly_spend));
            }

            Commands::SetBalance {
                amount,
                monthly_spend,
            } => {
                let balance = parse_amount(&amount)?;
                let monthly_spend = monthly_spend.as_deref().map(parse_amount).transpose()?;

                let summary = service.update_balance(balance, monthly_spend).await?;
                println!(
                    "Balance set: {} (monthly spend {})",
                    format_cents(summary.balance),
                    format_cents(summary.monthly_spend)
                );
            }

            Commands::Add {
                amount,
                date,
                description,
                details,
                category,
                account,
                tx_type,
            } => {
                let input = NewTransaction {
                    id: None,
                    amount: parse_amount(&amount)?,
                    date: date.unwrap_or_else(format_now),
                    description,
                    details,
                    category,
                    account_id: account,
                    tx_type,
                };

                let outcome = service.add_transaction(input).await?;
                println!(
                    "Recorded: {} {} ({})",
                    format_cents(outcome.transaction.amount),
                    outcome.transaction.date,
                    outcome.transaction.id
                );
                print_totals(outcome.balance, outcome.monthly_spend);
            }

            Commands::Update {
                id,
                amount,
                date,
                description,
                details,
                category,
                account,
                tx_type,
            } => {
                let update = TransactionUpdate {
                    amount: amount.as_deref().map(parse_amount).transpose()?,
                    date,
                    description,
                    details,
                    category,
                    account_id: account,
                    tx_type,
                };

                let outcome = service
                    .update_transaction(&id, update)
                    .await?
                    .with_context(|| format!("Transaction not found: {}", id))?;
                println!("Updated transaction {}", outcome.transaction.id);
                print_totals(outcome.balance, outcome.monthly_spend);
            }

            Commands::Delete { id } => {
                let outcome = service
                    .delete_transaction(&id)
                    .await?
                    .with_context(|| format!("Transaction not found: {}", id))?;
                println!(
                    "Deleted: {} {} ({})",
                    format_cents(outcome.transaction.amount),
                    outcome.transaction.date,
                    outcome.transaction.id
                );
                print_totals(outcome.balance, outcome.monthly_spend);
            }

            Commands::Transactions { limit } => {
                let transactions = service.get_transactions().await?;
                print_transactions(&transactions, limit);
            }

            Commands::Stats => {
                let stats = service.get_stats().await?;
                println!("Balance:        {:>12}", format_cents(stats.balance));
                println!("Monthly spend:  {:>12}", format_cents(stats.monthly_spend));
                println!("Total income:   {:>12}", format_cents(stats.total_income));
                println!("Total expense:  {:>12}", format_cents(stats.total_expense));
                println!("Transactions:   {:>12}", stats.total_transactions);
            }

            Commands::Check => {
                run_check_command(&service).await?;
            }

            Commands::Reconcile => {
                let summary = service.reconcile().await?;
                println!("Ledger reconciled.");
                print_totals(summary.balance, summary.monthly_spend);
            }

            Commands::Export {
                export_type,
                output,
            } => {
                run_export_command(&service, &export_type, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

fn print_totals(balance: Cents, monthly_spend: Cents) {
    println!(
        "Balance: {}  Monthly spend: {}",
        format_cents(balance),
        format_cents(monthly_spend)
    );
}

fn print_transactions(transactions: &[Transaction], limit: Option<usize>) {
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:<28} {:<17} {:>12} {:<12} {}",
        "ID", "DATE", "AMOUNT", "CATEGORY", "DESCRIPTION"
    );
    println!("{}", "-".repeat(90));
    for tx in transactions.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{:<28} {:<17} {:>12} {:<12} {}",
            tx.id,
            tx.date,
            format_cents(tx.amount),
            tx.category,
            tx.description
        );
    }
}

async fn run_check_command(service: &LedgerService) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = service.check_integrity().await?;

    println!("Transactions:  {}", report.transaction_count);
    println!(
        "Balance:       {:>12} stored, {:>12} derived",
        format_cents(report.stored_balance),
        format_cents(report.derived_balance)
    );
    println!(
        "Monthly spend: {:>12} stored, {:>12} derived",
        format_cents(report.stored_monthly_spend),
        format_cents(report.derived_monthly_spend)
    );
    if !report.unparsable_dates.is_empty() {
        println!(
            "Not counted in monthly spend (unreadable date): {}",
            report.unparsable_dates.join(", ")
        );
    }
    println!();

    if report.is_healthy() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "transactions" => {
            let count = exporter.export_transactions_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        "full" => {
            let export = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full ledger: {} transactions, balance {}",
                    export.snapshot.transactions.len(),
                    format_cents(export.snapshot.balance)
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: transactions, full",
                export_type
            );
        }
    }

    Ok(())
}
