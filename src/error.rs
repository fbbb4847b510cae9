use crate::domain::recurrence::RuleId;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Occurrence of rule {rule} on {date} already exists")]
    DuplicateOccurrence { rule: RuleId, date: NaiveDate },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
