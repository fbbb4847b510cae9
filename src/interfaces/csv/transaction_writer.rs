use crate::domain::summary::LedgerSummary;
use crate::domain::transaction::Transaction;
use crate::error::Result;
use chrono::SecondsFormat;
use serde::Serialize;
use std::io::Write;

const TRANSACTION_HEADER: [&str; 7] = [
    "id",
    "rule",
    "date",
    "amount",
    "description",
    "status",
    "paid_at",
];

#[derive(Serialize)]
struct TransactionRow {
    id: u32,
    rule: Option<u32>,
    date: String,
    amount: String,
    description: String,
    status: String,
    paid_at: Option<String>,
}

impl From<&Transaction> for TransactionRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            rule: tx.rule,
            date: tx.date.to_string(),
            amount: tx.amount.to_string(),
            description: tx.description.clone(),
            status: tx.status().to_string(),
            paid_at: tx
                .paid_at()
                .map(|at| at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

#[derive(Serialize)]
struct SummaryRow {
    transactions: usize,
    pending: usize,
    paid: usize,
    overdue: usize,
    pending_total: String,
    paid_total: String,
}

/// Writes transactions or a summary as CSV.
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// The header is written even when there are no transactions.
    pub fn write_transactions<'a, I>(&mut self, transactions: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut written = 0;
        for tx in transactions {
            self.writer.serialize(TransactionRow::from(tx))?;
            written += 1;
        }
        if written == 0 {
            self.writer.write_record(TRANSACTION_HEADER)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_summary(&mut self, summary: &LedgerSummary) -> Result<()> {
        self.writer.serialize(SummaryRow {
            transactions: summary.transactions,
            pending: summary.pending,
            paid: summary.paid,
            overdue: summary.overdue,
            pending_total: summary.pending_total.to_string(),
            paid_total: summary.paid_total.to_string(),
        })?;
        self.writer.flush()?;
        Ok(())
    }
}
