use paycycle::domain::recurrence::RecurrenceRule;
use paycycle::interfaces::csv::rule_reader::RuleReader;
use std::collections::HashSet;
use std::fs::File;

mod common;

#[test]
fn test_generate_simple_rules_csv() {
    let file = tempfile::NamedTempFile::new().unwrap();
    common::generate_rules_csv(file.path(), 5).expect("Failed to generate CSV");

    let content = std::fs::read_to_string(file.path()).expect("Failed to read file");
    // Header + 5 rows = 6 lines
    assert_eq!(content.lines().count(), 6);
}

#[test]
fn test_generated_rules_are_valid() {
    let file = tempfile::NamedTempFile::new().unwrap();
    common::generate_rules_csv(file.path(), 300).expect("Failed to generate CSV");

    let rules: Vec<RecurrenceRule> = RuleReader::new(File::open(file.path()).unwrap())
        .rules()
        .collect::<Result<_, _>>()
        .expect("Generated rules should parse");
    assert_eq!(rules.len(), 300);

    let kinds: HashSet<&str> = rules.iter().map(|rule| rule.frequency.name()).collect();
    assert_eq!(
        kinds.len(),
        3,
        "300 random rules should cover every frequency"
    );
    assert!(
        rules
            .iter()
            .filter_map(|rule| rule.frequency.interval_days())
            .all(|days| (1..=30).contains(&days.get()))
    );
    assert!(rules.iter().all(|rule| rule.last_generated_date.is_none()));
}
