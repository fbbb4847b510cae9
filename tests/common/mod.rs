use chrono::{Days, NaiveDate};
use rand::Rng;
use std::io::Error;
use std::path::Path;

pub const RULES_HEADER: [&str; 7] = [
    "id",
    "frequency",
    "anchor",
    "interval_days",
    "last_generated",
    "amount",
    "description",
];

/// Writes `rules` random but valid rule definitions anchored during 2023.
pub fn generate_rules_csv(path: &Path, rules: usize) -> Result<(), Error> {
    let mut rng = rand::thread_rng();
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(RULES_HEADER)?;

    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    for id in 1..=rules {
        let (frequency, interval) = match rng.gen_range(0..3) {
            0 => ("Weekly", String::new()),
            1 => ("Monthly", String::new()),
            _ => ("Custom", rng.gen_range(1..=30).to_string()),
        };
        let anchor = start + Days::new(rng.gen_range(0..365));
        let amount = format!("{}.{:02}", rng.gen_range(1..5000), rng.gen_range(0..100));

        wtr.write_record([
            id.to_string(),
            frequency.to_string(),
            anchor.to_string(),
            interval,
            String::new(),
            amount,
            format!("Rule {id}"),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
