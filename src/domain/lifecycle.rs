//! Status transitions for transactions.
//!
//! Both states are valid starting points and both can be re-entered, so
//! every transition is allowed. Repeating a transition rewrites the fields
//! it owns (last write wins); nothing here touches persistence.

use super::transaction::{PaymentState, Transaction, TransactionId, TransactionStatus};
use chrono::{DateTime, Utc};

/// Record of one applied transition.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct StatusChange {
    pub transaction: TransactionId,
    pub from: TransactionStatus,
    pub to: TransactionStatus,
    /// Payment timestamp written by the transition, if any.
    pub at: Option<DateTime<Utc>>,
}

impl StatusChange {
    /// Paid -> Paid or Pending -> Pending.
    pub fn is_repeat(&self) -> bool {
        self.from == self.to
    }
}

pub fn mark_as_paid(transaction: &mut Transaction, at: DateTime<Utc>) -> StatusChange {
    transition(transaction, PaymentState::Paid { paid_at: at })
}

pub fn mark_as_pending(transaction: &mut Transaction) -> StatusChange {
    transition(transaction, PaymentState::Pending)
}

fn transition(transaction: &mut Transaction, next: PaymentState) -> StatusChange {
    let from = transaction.status();
    transaction.state = next;
    StatusChange {
        transaction: transaction.id,
        from,
        to: next.status(),
        at: next.paid_at(),
    }
}
