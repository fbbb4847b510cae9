use chrono::NaiveDate;
use paycycle::application::engine::LedgerEngine;
use paycycle::domain::amount::Amount;
use paycycle::domain::recurrence::{Frequency, RecurrenceRule, TransactionTemplate};
use paycycle::infrastructure::in_memory::{InMemoryRuleStore, InMemoryTransactionStore};
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;

fn rule(id: u32, frequency: Frequency) -> RecurrenceRule {
    RecurrenceRule::new(
        id,
        frequency,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        None,
        TransactionTemplate {
            amount: Amount::new(dec!(5)).unwrap(),
            description: format!("Rule {id}"),
        },
    )
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scheduler_passes() {
    let engine = Arc::new(LedgerEngine::new(
        Box::new(InMemoryRuleStore::new()),
        Box::new(InMemoryTransactionStore::new()),
    ));

    engine.register_rule(rule(1, Frequency::Weekly)).await.unwrap();
    engine.register_rule(rule(2, Frequency::Monthly)).await.unwrap();
    engine
        .register_rule(rule(3, Frequency::from_parts("Custom", Some(3)).unwrap()))
        .await
        .unwrap();

    let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.run_due(today).await })
        })
        .collect();

    let mut generated = 0;
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.failed, 0);
        generated += report.generated;
    }

    let engine = Arc::into_inner(engine).expect("all tasks finished");
    let transactions = engine.into_results().await.unwrap();

    // 52 weekly + 11 monthly + 121 every third day
    assert_eq!(transactions.len(), 52 + 11 + 121);
    assert_eq!(generated, transactions.len());

    let unique: HashSet<_> = transactions.iter().map(|tx| (tx.rule, tx.date)).collect();
    assert_eq!(unique.len(), transactions.len());
}
