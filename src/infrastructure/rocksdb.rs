use crate::domain::ports::{RuleStore, TransactionStore};
use crate::domain::recurrence::{RecurrenceRule, RuleId};
use crate::domain::transaction::{NewTransaction, Transaction, TransactionId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing recurrence rules.
pub const CF_RULES: &str = "rules";
/// Column Family for storing transactions.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family indexing generated transactions by `(rule, date)`.
pub const CF_OCCURRENCES: &str = "occurrences";
/// Column Family for bookkeeping values such as the id counter.
pub const CF_META: &str = "meta";

const LAST_TRANSACTION_ID: &[u8] = b"last_transaction_id";

/// A persistent store implementation using RocksDB.
///
/// Handles storage for both `RecurrenceRule` and `Transaction` entities using
/// separate Column Families. New transactions are written in a single batch
/// together with their occurrence index entry and the id counter.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    create_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that all required column families exist.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_RULES, CF_TRANSACTIONS, CF_OCCURRENCES, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            create_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::Internal(Box::new(std::io::Error::other(format!(
                "Column family '{name}' not found"
            ))))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn all_json<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(decode(&value)?);
        }
        Ok(values)
    }

    fn last_transaction_id(&self) -> Result<TransactionId> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(cf, LAST_TRANSACTION_ID)? {
            Some(bytes) => {
                let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    LedgerError::Internal(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "Corrupt transaction id counter",
                    )))
                })?;
                Ok(TransactionId::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    /// Writes a transaction, its occurrence index entry and the id counter
    /// in one batch.
    fn write_transaction(&self, tx: &Transaction, stale: Option<Vec<u8>>) -> Result<()> {
        let transactions = self.cf(CF_TRANSACTIONS)?;
        let occurrences = self.cf(CF_OCCURRENCES)?;
        let meta = self.cf(CF_META)?;

        let mut batch = WriteBatch::default();
        if let Some(key) = stale {
            batch.delete_cf(occurrences, key);
        }
        batch.put_cf(transactions, tx.id.to_be_bytes(), encode(tx)?);
        if let Some(rule) = tx.rule {
            batch.put_cf(
                occurrences,
                occurrence_key(rule, tx.date),
                tx.id.to_be_bytes(),
            );
        }
        let last_id = self.last_transaction_id()?.max(tx.id);
        batch.put_cf(meta, LAST_TRANSACTION_ID, last_id.to_be_bytes());

        self.db.write(batch)?;
        Ok(())
    }
}

fn occurrence_key(rule: RuleId, date: NaiveDate) -> Vec<u8> {
    let mut key = rule.to_be_bytes().to_vec();
    key.extend_from_slice(date.to_string().as_bytes());
    key
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        LedgerError::Internal(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {}", e),
        )))
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        LedgerError::Internal(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {}", e),
        )))
    })
}

#[async_trait]
impl RuleStore for RocksDBStore {
    async fn store(&self, rule: RecurrenceRule) -> Result<()> {
        let cf = self.cf(CF_RULES)?;
        self.db.put_cf(cf, rule.id.to_be_bytes(), encode(&rule)?)?;
        Ok(())
    }

    async fn get(&self, rule_id: RuleId) -> Result<Option<RecurrenceRule>> {
        self.get_json(CF_RULES, &rule_id.to_be_bytes())
    }

    async fn get_all(&self) -> Result<Vec<RecurrenceRule>> {
        self.all_json(CF_RULES)
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn store(&self, tx: Transaction) -> Result<()> {
        let _guard = self.create_lock.lock().await;
        let previous: Option<Transaction> =
            self.get_json(CF_TRANSACTIONS, &tx.id.to_be_bytes())?;
        let stale = previous.and_then(|p| p.rule.map(|rule| occurrence_key(rule, p.date)));
        self.write_transaction(&tx, stale)
    }

    async fn get(&self, tx_id: TransactionId) -> Result<Option<Transaction>> {
        self.get_json(CF_TRANSACTIONS, &tx_id.to_be_bytes())
    }

    async fn create(&self, new_tx: NewTransaction) -> Result<Transaction> {
        let _guard = self.create_lock.lock().await;

        if let Some(rule) = new_tx.rule {
            let occurrences = self.cf(CF_OCCURRENCES)?;
            let key = occurrence_key(rule, new_tx.date);
            // Just check if the key exists without retrieving the value
            if self.db.get_pinned_cf(occurrences, key)?.is_some() {
                return Err(LedgerError::DuplicateOccurrence {
                    rule,
                    date: new_tx.date,
                });
            }
        }

        let id = self.last_transaction_id()?.checked_add(1).ok_or_else(|| {
            LedgerError::Internal(Box::new(std::io::Error::other(
                "Transaction id space exhausted",
            )))
        })?;
        let tx = new_tx.into_transaction(id);
        self.write_transaction(&tx, None)?;
        Ok(tx)
    }

    async fn get_all(&self) -> Result<Vec<Transaction>> {
        // Keys are big-endian ids, so iteration order is id order.
        self.all_json(CF_TRANSACTIONS)
    }
}
