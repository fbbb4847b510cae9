use crate::domain::ports::{RuleStore, TransactionStore};
use crate::domain::recurrence::{RecurrenceRule, RuleId};
use crate::domain::transaction::{NewTransaction, Transaction, TransactionId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for recurrence rules.
///
/// Uses `Arc<RwLock<HashMap<RuleId, RecurrenceRule>>>` to allow shared concurrent access.
#[derive(Default, Clone)]
pub struct InMemoryRuleStore {
    rules: Arc<RwLock<HashMap<RuleId, RecurrenceRule>>>,
}

impl InMemoryRuleStore {
    /// Creates a new, empty in-memory rule store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn store(&self, rule: RecurrenceRule) -> Result<()> {
        let mut rules = self.rules.write().await;
        rules.insert(rule.id, rule);
        Ok(())
    }

    async fn get(&self, rule_id: RuleId) -> Result<Option<RecurrenceRule>> {
        let rules = self.rules.read().await;
        Ok(rules.get(&rule_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<RecurrenceRule>> {
        let rules = self.rules.read().await;
        let mut all: Vec<RecurrenceRule> = rules.values().cloned().collect();
        all.sort_by_key(|rule| rule.id);
        Ok(all)
    }
}

#[derive(Default)]
struct TransactionTable {
    transactions: HashMap<TransactionId, Transaction>,
    occurrences: HashMap<(RuleId, NaiveDate), TransactionId>,
    last_id: TransactionId,
}

impl TransactionTable {
    fn insert(&mut self, tx: Transaction) {
        if let Some(rule) = tx.rule {
            self.occurrences.insert((rule, tx.date), tx.id);
        }
        self.last_id = self.last_id.max(tx.id);
        self.transactions.insert(tx.id, tx);
    }
}

/// A thread-safe in-memory store for transactions.
///
/// Keeps an index of `(rule, date)` pairs so generated occurrences are
/// unique, and hands out increasing ids.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    table: Arc<RwLock<TransactionTable>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn store(&self, tx: Transaction) -> Result<()> {
        let mut table = self.table.write().await;
        let stale = table
            .transactions
            .get(&tx.id)
            .and_then(|previous| previous.rule.map(|rule| (rule, previous.date)));
        if let Some(key) = stale {
            table.occurrences.remove(&key);
        }
        table.insert(tx);
        Ok(())
    }

    async fn get(&self, tx_id: TransactionId) -> Result<Option<Transaction>> {
        let table = self.table.read().await;
        Ok(table.transactions.get(&tx_id).cloned())
    }

    async fn create(&self, new_tx: NewTransaction) -> Result<Transaction> {
        let mut table = self.table.write().await;
        if let Some(rule) = new_tx.rule
            && table.occurrences.contains_key(&(rule, new_tx.date))
        {
            return Err(LedgerError::DuplicateOccurrence {
                rule,
                date: new_tx.date,
            });
        }

        let id = table.last_id.checked_add(1).ok_or_else(|| {
            LedgerError::Internal(Box::new(std::io::Error::other(
                "Transaction id space exhausted",
            )))
        })?;
        let tx = new_tx.into_transaction(id);
        table.insert(tx.clone());
        Ok(tx)
    }

    async fn get_all(&self) -> Result<Vec<Transaction>> {
        let table = self.table.read().await;
        let mut all: Vec<Transaction> = table.transactions.values().cloned().collect();
        all.sort_by_key(|tx| tx.id);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::Amount;
    use crate::domain::recurrence::{Frequency, TransactionTemplate};
    use crate::domain::transaction::PaymentState;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn occurrence(rule: Option<RuleId>, day: u32) -> NewTransaction {
        NewTransaction {
            rule,
            date: date(day),
            amount: Amount::new(dec!(10)).unwrap(),
            description: "Phone".to_string(),
            state: PaymentState::Pending,
        }
    }

    #[tokio::test]
    async fn test_in_memory_rule_store() {
        let store = InMemoryRuleStore::new();
        let rule = RecurrenceRule::new(
            4,
            Frequency::Monthly,
            date(1),
            None,
            TransactionTemplate {
                amount: Amount::new(dec!(900)).unwrap(),
                description: "Rent".to_string(),
            },
        )
        .unwrap();

        store.store(rule.clone()).await.unwrap();
        assert_eq!(store.get(4).await.unwrap(), Some(rule.clone()));
        assert!(store.get(5).await.unwrap().is_none());
        assert_eq!(store.get_all().await.unwrap(), vec![rule]);
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = InMemoryTransactionStore::new();
        let first = store.create(occurrence(Some(1), 1)).await.unwrap();
        let second = store.create(occurrence(None, 1)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.get(2).await.unwrap(), Some(second));
        assert_eq!(store.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_occurrence() {
        let store = InMemoryTransactionStore::new();
        store.create(occurrence(Some(1), 8)).await.unwrap();

        let result = store.create(occurrence(Some(1), 8)).await;
        assert!(matches!(
            result,
            Err(LedgerError::DuplicateOccurrence { rule: 1, .. })
        ));

        // Same date on another rule, or without a rule, is fine.
        store.create(occurrence(Some(2), 8)).await.unwrap();
        store.create(occurrence(None, 8)).await.unwrap();
        store.create(occurrence(None, 8)).await.unwrap();
        assert_eq!(store.get_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_store_keeps_id_counter_ahead() {
        let store = InMemoryTransactionStore::new();
        store
            .store(occurrence(None, 2).into_transaction(40))
            .await
            .unwrap();

        let created = store.create(occurrence(None, 3)).await.unwrap();
        assert_eq!(created.id, 41);
    }
}
