use crate::domain::amount::Amount;
use crate::domain::recurrence::{Frequency, RecurrenceRule, RuleId, TransactionTemplate};
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row of a rules file, before validation.
#[derive(Debug, Deserialize)]
struct RuleRecord {
    id: RuleId,
    frequency: String,
    anchor: NaiveDate,
    interval_days: Option<i64>,
    last_generated: Option<NaiveDate>,
    amount: Decimal,
    description: Option<String>,
}

impl TryFrom<RuleRecord> for RecurrenceRule {
    type Error = LedgerError;

    fn try_from(record: RuleRecord) -> Result<Self> {
        let frequency = Frequency::from_parts(&record.frequency, record.interval_days)?;
        let amount = Amount::new(record.amount).map_err(|_| {
            LedgerError::InvalidRule(format!(
                "rule {} has a non-positive amount {}",
                record.id, record.amount
            ))
        })?;

        RecurrenceRule::new(
            record.id,
            frequency,
            record.anchor,
            record.last_generated,
            TransactionTemplate {
                amount,
                description: record.description.unwrap_or_default(),
            },
        )
    }
}

/// Reads recurrence rules from a CSV source.
///
/// Expected header: `id, frequency, anchor, interval_days, last_generated,
/// amount, description`. Each row is validated on its own, so one bad row
/// does not stop the stream.
pub struct RuleReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RuleReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and validates rules.
    pub fn rules(self) -> impl Iterator<Item = Result<RecurrenceRule>> {
        self.reader
            .into_deserialize::<RuleRecord>()
            .map(|record| RecurrenceRule::try_from(record?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "id, frequency, anchor, interval_days, last_generated, amount, description";

    fn read(rows: &str) -> Vec<Result<RecurrenceRule>> {
        let data = format!("{HEADER}\n{rows}");
        RuleReader::new(data.as_bytes()).rules().collect()
    }

    #[test]
    fn test_reader_valid_stream() {
        let results = read(
            "1, Weekly, 2024-01-01, , , 12.5, Groceries\n\
             2, custom, 2024-01-01, 10, 2024-01-11, 30, Fuel\n\
             3, Monthly, 2024-01-31, , , 900",
        );

        assert_eq!(results.len(), 3);
        let weekly = results[0].as_ref().unwrap();
        assert_eq!(weekly.frequency, Frequency::Weekly);
        assert_eq!(weekly.template.amount.value(), dec!(12.5));
        assert_eq!(weekly.template.description, "Groceries");

        let custom = results[1].as_ref().unwrap();
        assert_eq!(custom.frequency.interval_days().map(|d| d.get()), Some(10));
        assert_eq!(
            custom.last_generated_date,
            NaiveDate::from_ymd_opt(2024, 1, 11)
        );

        let monthly = results[2].as_ref().unwrap();
        assert_eq!(monthly.template.description, "");
    }

    #[test]
    fn test_reader_rejects_invalid_rules() {
        let results = read(
            "1, Custom, 2024-01-01, , , 10, Missing interval\n\
             2, Custom, 2024-01-01, 0, , 10, Zero interval\n\
             3, Weekly, 2024-01-01, , 2023-12-01, 10, Before anchor\n\
             4, Weekly, 2024-01-01, , , -5, Negative",
        );

        assert_eq!(results.len(), 4);
        for result in results {
            assert!(matches!(result, Err(LedgerError::InvalidRule(_))));
        }
    }

    #[test]
    fn test_reader_malformed_line() {
        let results = read("x, Weekly, not-a-date, , , 10, Broken");
        assert!(matches!(results[0], Err(LedgerError::Csv(_))));
    }
}
