use super::amount::Amount;
use super::transaction::{NewTransaction, PaymentState};
use crate::error::{LedgerError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

pub type RuleId = u32;

const DAYS_PER_WEEK: u64 = 7;

/// How often a rule repeats.
///
/// The custom interval only exists on `Custom`, so a custom rule without an
/// interval cannot be constructed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(tag = "frequency")]
pub enum Frequency {
    Weekly,
    Monthly,
    Custom { interval_days: NonZeroU32 },
}

impl Frequency {
    /// Builds a frequency from its persisted name and an optional interval.
    ///
    /// The interval is ignored for `Weekly` and `Monthly`, and must be a
    /// positive number of days for `Custom`.
    pub fn from_parts(name: &str, interval_days: Option<i64>) -> Result<Self> {
        if name.eq_ignore_ascii_case("weekly") {
            Ok(Self::Weekly)
        } else if name.eq_ignore_ascii_case("monthly") {
            Ok(Self::Monthly)
        } else if name.eq_ignore_ascii_case("custom") {
            let days = interval_days.ok_or_else(|| {
                LedgerError::InvalidRule("Custom frequency requires interval_days".to_string())
            })?;
            u32::try_from(days)
                .ok()
                .and_then(NonZeroU32::new)
                .map(|interval_days| Self::Custom { interval_days })
                .ok_or_else(|| {
                    LedgerError::InvalidRule(format!(
                        "interval_days must be a positive number of days, got {days}"
                    ))
                })
        } else {
            Err(LedgerError::InvalidRule(format!(
                "Unknown frequency '{name}'"
            )))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Custom { .. } => "Custom",
        }
    }

    pub fn interval_days(&self) -> Option<NonZeroU32> {
        match self {
            Self::Custom { interval_days } => Some(*interval_days),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What every generated transaction of a rule looks like.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionTemplate {
    pub amount: Amount,
    pub description: String,
}

/// A recurring transaction definition.
///
/// Deserialization goes through [`RecurrenceRule::new`], so stored rules are
/// validated on load.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(try_from = "StoredRule")]
pub struct RecurrenceRule {
    pub id: RuleId,
    #[serde(flatten)]
    pub frequency: Frequency,
    /// First occurrence; defines the phase of the schedule.
    pub anchor_date: NaiveDate,
    /// Most recently materialized occurrence. Never before `anchor_date`.
    pub last_generated_date: Option<NaiveDate>,
    pub template: TransactionTemplate,
}

#[derive(Deserialize)]
struct StoredRule {
    id: RuleId,
    #[serde(flatten)]
    frequency: Frequency,
    anchor_date: NaiveDate,
    last_generated_date: Option<NaiveDate>,
    template: TransactionTemplate,
}

impl TryFrom<StoredRule> for RecurrenceRule {
    type Error = LedgerError;

    fn try_from(stored: StoredRule) -> Result<Self> {
        Self::new(
            stored.id,
            stored.frequency,
            stored.anchor_date,
            stored.last_generated_date,
            stored.template,
        )
    }
}

impl RecurrenceRule {
    pub fn new(
        id: RuleId,
        frequency: Frequency,
        anchor_date: NaiveDate,
        last_generated_date: Option<NaiveDate>,
        template: TransactionTemplate,
    ) -> Result<Self> {
        if let Some(last) = last_generated_date
            && last < anchor_date
        {
            return Err(LedgerError::InvalidRule(format!(
                "last generated date {last} is before anchor date {anchor_date}"
            )));
        }

        Ok(Self {
            id,
            frequency,
            anchor_date,
            last_generated_date,
            template,
        })
    }

    /// Returns the first occurrence strictly after `after_date`.
    ///
    /// Pure: the rule is not modified.
    pub fn next_occurrence(&self, after_date: NaiveDate) -> Result<NaiveDate> {
        let next = match self.frequency {
            Frequency::Weekly => {
                let base = after_date.max(self.anchor_date);
                let elapsed = (base - self.anchor_date).num_days().unsigned_abs();
                let weeks = elapsed / DAYS_PER_WEEK + 1;
                weeks
                    .checked_mul(DAYS_PER_WEEK)
                    .and_then(|days| self.anchor_date.checked_add_days(Days::new(days)))
            }
            Frequency::Monthly => {
                let base = after_date.max(self.anchor_date);
                first_of_month(base)
                    .and_then(|first| first.checked_add_months(Months::new(1)))
                    .and_then(|target| {
                        clamp_to_month(target.year(), target.month(), self.anchor_date.day())
                    })
            }
            Frequency::Custom { interval_days } => {
                after_date.checked_add_days(Days::new(u64::from(interval_days.get())))
            }
        };

        next.ok_or_else(|| {
            LedgerError::InvalidRule(format!(
                "next occurrence of rule {} after {after_date} is out of range",
                self.id
            ))
        })
    }

    /// Moves the rule forward by one occurrence if one is due on or before
    /// `today`.
    ///
    /// On success `last_generated_date` is updated and the caller is
    /// expected to persist the rule; a second call before that would hand
    /// out the following occurrence, never the same one.
    pub fn advance(&mut self, today: NaiveDate) -> Result<Option<NewTransaction>> {
        let reference = self.last_generated_date.unwrap_or(self.anchor_date);
        let next = self.next_occurrence(reference)?;
        if next > today {
            return Ok(None);
        }

        self.last_generated_date = Some(next);
        Ok(Some(self.materialize(next)))
    }

    fn materialize(&self, date: NaiveDate) -> NewTransaction {
        NewTransaction {
            rule: Some(self.id),
            date,
            amount: self.template.amount,
            description: self.template.description.clone(),
            state: PaymentState::Pending,
        }
    }
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

/// `day` of the given month, or the month's last day when it is shorter.
fn clamp_to_month(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    (1..=day)
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}
