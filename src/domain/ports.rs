use super::recurrence::{RecurrenceRule, RuleId};
use super::transaction::{NewTransaction, Transaction, TransactionId};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn store(&self, rule: RecurrenceRule) -> Result<()>;
    async fn get(&self, rule_id: RuleId) -> Result<Option<RecurrenceRule>>;
    async fn get_all(&self) -> Result<Vec<RecurrenceRule>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn store(&self, tx: Transaction) -> Result<()>;
    async fn get(&self, tx_id: TransactionId) -> Result<Option<Transaction>>;
    /// Assigns the next id and records the transaction.
    ///
    /// Fails with `LedgerError::DuplicateOccurrence` when a transaction for
    /// the same rule and date already exists.
    async fn create(&self, new_tx: NewTransaction) -> Result<Transaction>;
    async fn get_all(&self) -> Result<Vec<Transaction>>;
}

pub type RuleStoreBox = Box<dyn RuleStore>;
pub type TransactionStoreBox = Box<dyn TransactionStore>;

pub type RuleStoreFactory = Box<dyn Fn() -> RuleStoreBox + Send + Sync>;
pub type TransactionStoreFactory = Box<dyn Fn() -> TransactionStoreBox + Send + Sync>;
