use crate::domain::lifecycle::{self, StatusChange};
use crate::domain::ports::{RuleStoreBox, TransactionStoreBox};
use crate::domain::recurrence::{RecurrenceRule, RuleId};
use crate::domain::summary::LedgerSummary;
use crate::domain::transaction::{Transaction, TransactionId};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of one scheduler pass over all rules.
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct ScheduleReport {
    pub rules: usize,
    pub generated: usize,
    pub failed: usize,
}

/// The main entry point for recurring transaction bookkeeping.
///
/// `LedgerEngine` owns the storage backends. Work on a single rule is
/// serialized through a per-rule lock so concurrent passes cannot both
/// observe the same `last_generated_date`; rules never wait on each other.
pub struct LedgerEngine {
    rule_store: RuleStoreBox,
    transaction_store: TransactionStoreBox,
    rule_locks: Mutex<HashMap<RuleId, Arc<Mutex<()>>>>,
}

impl LedgerEngine {
    /// Creates a new `LedgerEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `rule_store` - The store for recurrence rules.
    /// * `transaction_store` - The store for transactions.
    pub fn new(rule_store: RuleStoreBox, transaction_store: TransactionStoreBox) -> Self {
        Self {
            rule_store,
            transaction_store,
            rule_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn rule_lock(&self, rule_id: RuleId) -> Arc<Mutex<()>> {
        let mut locks = self.rule_locks.lock().await;
        locks.entry(rule_id).or_default().clone()
    }

    /// Adds or replaces a rule definition.
    ///
    /// Progress already stored for the same rule id is kept when it is
    /// further along, so importing the same definitions again does not
    /// regenerate occurrences.
    pub async fn register_rule(&self, mut rule: RecurrenceRule) -> Result<()> {
        let lock = self.rule_lock(rule.id).await;
        let _guard = lock.lock().await;

        if let Some(stored) = self.rule_store.get(rule.id).await?
            && stored.last_generated_date > rule.last_generated_date
            && stored.last_generated_date >= Some(rule.anchor_date)
        {
            tracing::debug!(
                rule = rule.id,
                last_generated = ?stored.last_generated_date,
                "Keeping stored progress"
            );
            rule.last_generated_date = stored.last_generated_date;
        }

        self.rule_store.store(rule).await
    }

    /// Materializes every occurrence of one rule that is due on or before
    /// `today`.
    ///
    /// Each transaction is created before the rule's progress is saved, so
    /// a failure in between repeats the occurrence rather than losing it.
    /// An occurrence that already exists is skipped.
    pub async fn advance_rule(
        &self,
        rule_id: RuleId,
        today: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        // Unknown ids never get a lock entry.
        if self.rule_store.get(rule_id).await?.is_none() {
            return Err(unknown_rule(rule_id));
        }

        let lock = self.rule_lock(rule_id).await;
        let _guard = lock.lock().await;

        let mut rule = self
            .rule_store
            .get(rule_id)
            .await?
            .ok_or_else(|| unknown_rule(rule_id))?;

        let mut created = Vec::new();
        while let Some(request) = rule.advance(today)? {
            let date = request.date;
            match self.transaction_store.create(request).await {
                Ok(tx) => {
                    tracing::info!(rule = rule_id, tx = tx.id, %date, "Generated occurrence");
                    created.push(tx);
                }
                Err(LedgerError::DuplicateOccurrence { .. }) => {
                    tracing::debug!(rule = rule_id, %date, "Occurrence already exists");
                }
                Err(e) => return Err(e),
            }
            self.rule_store.store(rule.clone()).await?;
        }

        Ok(created)
    }

    /// Runs one scheduler pass over all stored rules.
    ///
    /// A rule that fails is logged and counted; the remaining rules are
    /// still processed.
    pub async fn run_due(&self, today: NaiveDate) -> Result<ScheduleReport> {
        let mut report = ScheduleReport::default();
        for rule in self.rule_store.get_all().await? {
            report.rules += 1;
            match self.advance_rule(rule.id, today).await {
                Ok(created) => report.generated += created.len(),
                Err(e) => {
                    tracing::error!(rule = rule.id, error = %e, "Failed to advance rule");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            %today,
            rules = report.rules,
            generated = report.generated,
            failed = report.failed,
            "Scheduler pass finished"
        );
        Ok(report)
    }

    /// Marks a transaction as paid at `at` and saves it.
    pub async fn mark_as_paid(
        &self,
        tx_id: TransactionId,
        at: DateTime<Utc>,
    ) -> Result<Transaction> {
        self.apply_status(tx_id, |tx| lifecycle::mark_as_paid(tx, at))
            .await
    }

    /// Marks a transaction as pending, clearing its payment time, and saves it.
    pub async fn mark_as_pending(&self, tx_id: TransactionId) -> Result<Transaction> {
        self.apply_status(tx_id, lifecycle::mark_as_pending).await
    }

    async fn apply_status<F>(&self, tx_id: TransactionId, transition: F) -> Result<Transaction>
    where
        F: FnOnce(&mut Transaction) -> StatusChange,
    {
        let mut tx = self
            .transaction_store
            .get(tx_id)
            .await?
            .ok_or_else(|| LedgerError::InvalidArgument(format!("Unknown transaction {tx_id}")))?;

        let change = transition(&mut tx);
        self.transaction_store.store(tx.clone()).await?;

        tracing::info!(
            tx = change.transaction,
            from = %change.from,
            to = %change.to,
            at = ?change.at,
            repeat = change.is_repeat(),
            "Transaction status changed"
        );
        Ok(tx)
    }

    /// Dashboard statistics over every stored transaction.
    pub async fn summary(&self, today: NaiveDate) -> Result<LedgerSummary> {
        let transactions = self.transaction_store.get_all().await?;
        Ok(LedgerSummary::from_transactions(&transactions, today))
    }

    /// Consumes the engine and returns all transactions ordered by id.
    pub async fn into_results(self) -> Result<Vec<Transaction>> {
        let mut transactions = self.transaction_store.get_all().await?;
        transactions.sort_by_key(|tx| tx.id);
        Ok(transactions)
    }
}

fn unknown_rule(rule_id: RuleId) -> LedgerError {
    LedgerError::InvalidArgument(format!("Unknown rule {rule_id}"))
}
