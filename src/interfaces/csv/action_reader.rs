use crate::domain::transaction::{TransactionId, TransactionStatus};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::Read;

/// A requested status change, as read from an actions file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct StatusAction {
    #[serde(deserialize_with = "deserialize_status")]
    pub action: TransactionStatus,
    pub tx: TransactionId,
    /// Payment time for `paid`; ignored for `pending`.
    pub at: Option<DateTime<Utc>>,
}

fn deserialize_status<'de, D>(deserializer: D) -> std::result::Result<TransactionStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Reads status actions (`action, tx, at`) from a CSV source.
pub struct ActionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ActionReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn actions(self) -> impl Iterator<Item = Result<StatusAction>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
