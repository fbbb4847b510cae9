use super::amount::Amount;
use super::recurrence::RuleId;
use crate::error::LedgerError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TransactionId = u32;

/// Persisted status vocabulary. The identifiers are part of the stored data
/// and must not be renamed without a migration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum TransactionStatus {
    Pending,
    Paid,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Paid => f.write_str("Paid"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pending") {
            Ok(Self::Pending)
        } else if s.eq_ignore_ascii_case("paid") {
            Ok(Self::Paid)
        } else {
            Err(LedgerError::InvalidArgument(format!(
                "Unknown transaction status '{s}'"
            )))
        }
    }
}

/// Payment state of a transaction. A paid timestamp only exists on `Paid`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Default)]
#[serde(tag = "status")]
pub enum PaymentState {
    #[default]
    Pending,
    Paid { paid_at: DateTime<Utc> },
}

impl PaymentState {
    pub fn status(&self) -> TransactionStatus {
        match self {
            Self::Pending => TransactionStatus::Pending,
            Self::Paid { .. } => TransactionStatus::Paid,
        }
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Pending => None,
            Self::Paid { paid_at } => Some(*paid_at),
        }
    }
}

/// Fields needed to materialize a transaction before the store assigns it
/// an id.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct NewTransaction {
    pub rule: Option<RuleId>,
    pub date: NaiveDate,
    pub amount: Amount,
    pub description: String,
    #[serde(default)]
    pub state: PaymentState,
}

impl NewTransaction {
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            rule: self.rule,
            date: self.date,
            amount: self.amount,
            description: self.description,
            state: self.state,
        }
    }
}

/// A recorded transaction.
///
/// `state` is only changed through [`crate::domain::lifecycle`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    /// Rule that generated this transaction, if any. Lookup only.
    pub rule: Option<RuleId>,
    pub date: NaiveDate,
    pub amount: Amount,
    pub description: String,
    #[serde(flatten)]
    pub(crate) state: PaymentState,
}

impl Transaction {
    pub fn state(&self) -> PaymentState {
        self.state
    }

    pub fn status(&self) -> TransactionStatus {
        self.state.status()
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.state.paid_at()
    }
}
