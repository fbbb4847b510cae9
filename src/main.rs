use chrono::{NaiveDate, Utc};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paycycle::application::engine::LedgerEngine;
use paycycle::domain::transaction::TransactionStatus;
use paycycle::infrastructure::in_memory::{InMemoryRuleStore, InMemoryTransactionStore};
use paycycle::interfaces::csv::action_reader::ActionReader;
use paycycle::interfaces::csv::rule_reader::RuleReader;
use paycycle::interfaces::csv::transaction_writer::TransactionWriter;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Recurrence rules CSV file
    rules: PathBuf,

    /// Day to generate occurrences up to (defaults to the current UTC date)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Status actions CSV file, applied after scheduling
    #[arg(long)]
    actions: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Print dashboard statistics instead of the transaction list
    #[arg(long)]
    summary: bool,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("PAYCYCLE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn in_memory_engine() -> LedgerEngine {
    LedgerEngine::new(
        Box::new(InMemoryRuleStore::new()),
        Box::new(InMemoryTransactionStore::new()),
    )
}

#[cfg(feature = "storage-rocksdb")]
fn persistent_engine(db_path: &Path) -> Result<LedgerEngine> {
    use paycycle::domain::ports::{RuleStoreBox, TransactionStoreBox};
    use paycycle::infrastructure::rocksdb::RocksDBStore;

    let store = RocksDBStore::open(db_path).into_diagnostic()?;
    tracing::info!(path = %db_path.display(), "Using RocksDB storage");

    let rule_store: RuleStoreBox = Box::new(store.clone());
    let transaction_store: TransactionStoreBox = Box::new(store);
    Ok(LedgerEngine::new(rule_store, transaction_store))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn persistent_engine(_db_path: &Path) -> Result<LedgerEngine> {
    tracing::warn!(
        "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
    );
    Ok(in_memory_engine())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // One clock reading for the whole run.
    let now = Utc::now();
    let today = cli.today.unwrap_or_else(|| now.date_naive());

    let engine = match &cli.db_path {
        Some(db_path) => persistent_engine(db_path)?,
        None => in_memory_engine(),
    };

    let file = File::open(&cli.rules).into_diagnostic()?;
    for rule in RuleReader::new(file).rules() {
        match rule {
            Ok(rule) => {
                if let Err(e) = engine.register_rule(rule).await {
                    tracing::error!("Error registering rule: {}", e);
                }
            }
            Err(e) => tracing::error!("Error reading rule: {}", e),
        }
    }

    engine.run_due(today).await.into_diagnostic()?;

    if let Some(actions) = &cli.actions {
        let file = File::open(actions).into_diagnostic()?;
        for action in ActionReader::new(file).actions() {
            let result = match action {
                Ok(action) => match action.action {
                    TransactionStatus::Paid => {
                        engine
                            .mark_as_paid(action.tx, action.at.unwrap_or(now))
                            .await
                    }
                    TransactionStatus::Pending => engine.mark_as_pending(action.tx).await,
                },
                Err(e) => {
                    tracing::error!("Error reading action: {}", e);
                    continue;
                }
            };
            if let Err(e) = result {
                tracing::error!("Error applying action: {}", e);
            }
        }
    }

    let stdout = io::stdout();
    let mut writer = TransactionWriter::new(stdout.lock());
    if cli.summary {
        let summary = engine.summary(today).await.into_diagnostic()?;
        writer.write_summary(&summary).into_diagnostic()?;
    } else {
        let transactions = engine.into_results().await.into_diagnostic()?;
        writer.write_transactions(&transactions).into_diagnostic()?;
    }

    Ok(())
}
