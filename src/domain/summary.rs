use super::amount::Balance;
use super::transaction::{Transaction, TransactionStatus};
use chrono::NaiveDate;
use serde::Serialize;

/// Dashboard statistics over a set of transactions.
#[derive(Debug, Serialize, PartialEq, Clone, Copy, Default)]
pub struct LedgerSummary {
    pub transactions: usize,
    pub pending: usize,
    pub paid: usize,
    /// Pending transactions dated before the reference day.
    pub overdue: usize,
    pub pending_total: Balance,
    pub paid_total: Balance,
}

impl LedgerSummary {
    pub fn from_transactions<'a, I>(transactions: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut summary = Self::default();
        for tx in transactions {
            summary.transactions += 1;
            match tx.status() {
                TransactionStatus::Pending => {
                    summary.pending += 1;
                    summary.pending_total += tx.amount;
                    if tx.date < today {
                        summary.overdue += 1;
                    }
                }
                TransactionStatus::Paid => {
                    summary.paid += 1;
                    summary.paid_total += tx.amount;
                }
            }
        }
        summary
    }
}
