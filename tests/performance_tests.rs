use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_many_rules_over_several_years() {
    let file = tempfile::NamedTempFile::new().unwrap();
    common::generate_rules_csv(file.path(), 500).expect("Failed to generate rules CSV");

    let assert = Command::new(cargo_bin!("paycycle"))
        .env("PAYCYCLE_LOG", "warn")
        .arg(file.path())
        .arg("--today")
        .arg("2026-12-31")
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "transactions,pending,paid,overdue,pending_total,paid_total\n",
        ));

    let output = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let row = output.lines().nth(1).expect("summary row");
    let generated: usize = row.split(',').next().unwrap().parse().unwrap();
    // Every rule is anchored in 2023, so each has produced at least three
    // years of monthly occurrences.
    assert!(generated >= 500 * 36, "only {generated} transactions");
}
