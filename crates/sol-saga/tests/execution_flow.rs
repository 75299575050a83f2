//! Integration tests for sequential saga execution.

use std::sync::{Arc, Mutex};

use sol_saga::{SagaBuilder, SagaResult, SagaState};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

type CallLog = Arc<Mutex<Vec<String>>>;

fn order_saga(success: bool, payload: &'static str, log: &CallLog) -> SagaBuilder<TestError> {
    let mut builder = SagaBuilder::new("Order").activity("Order-Process", move || async move {
        Ok(SagaResult::new(success, payload.to_string()))
    });

    for label in ["Compensation-1", "Compensation-2"] {
        let log = Arc::clone(log);
        builder = builder.compensation_activity(
            "Order-Process",
            label,
            move |result: SagaResult<String>| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().expect("lock").push(format!(
                        "{label} success={} payload={}",
                        result.is_success(),
                        result.payload()
                    ));
                    Ok(())
                }
            },
        );
    }
    builder
}

#[tokio::test]
async fn order_example_success_runs_no_compensation() -> anyhow::Result<()> {
    let log = CallLog::default();
    let mut saga = order_saga(true, "My-Order-Complete", &log).build()?;

    assert_eq!(saga.name(), "Order");
    saga.execute().await?;

    assert_eq!(saga.ledger().len(), 1);
    let record = saga
        .ledger()
        .find("Order-Process", true)
        .expect("successful record");
    assert_eq!(
        record.result().payload::<String>().map(String::as_str),
        Some("My-Order-Complete")
    );
    assert!(log.lock().expect("lock").is_empty());
    Ok(())
}

#[tokio::test]
async fn order_example_failure_runs_both_compensations_in_order() -> anyhow::Result<()> {
    let log = CallLog::default();
    let mut saga = order_saga(false, "partial", &log).build()?;

    saga.execute().await?;

    assert_eq!(
        *log.lock().expect("lock"),
        vec![
            "Compensation-1 success=false payload=partial",
            "Compensation-2 success=false payload=partial",
        ]
    );
    assert_eq!(saga.ledger().len(), 1);
    let record = saga
        .ledger()
        .first_by_name("Order-Process")
        .expect("record exists");
    assert!(!record.is_success());
    assert!(saga.ledger().find("Order-Process", true).is_none());
    assert_eq!(saga.state(), SagaState::Completed);
    Ok(())
}

#[tokio::test]
async fn all_success_saga_records_every_activity_in_order() -> anyhow::Result<()> {
    let executed = CallLog::default();
    let mut builder = SagaBuilder::<TestError>::new("Pipeline");
    for index in 0..5 {
        let executed = Arc::clone(&executed);
        builder = builder.activity(format!("step-{index}"), move || {
            let executed = Arc::clone(&executed);
            async move {
                executed.lock().expect("lock").push(format!("step-{index}"));
                Ok(SagaResult::success(index))
            }
        });
    }
    let mut saga = builder.build()?;

    saga.execute().await?;

    let names: Vec<_> = saga
        .ledger()
        .iter()
        .map(|record| record.activity_name().to_string())
        .collect();
    assert_eq!(names, *executed.lock().expect("lock"));
    assert_eq!(saga.ledger().len(), 5);
    assert_eq!(saga.ledger().successes().count(), 5);
    assert_eq!(saga.ledger().failures().count(), 0);
    Ok(())
}

#[tokio::test]
async fn heterogeneous_payloads_share_one_ledger() -> anyhow::Result<()> {
    #[derive(Debug, Clone, PartialEq)]
    struct Receipt {
        amount_cents: u64,
    }

    let mut saga = SagaBuilder::<TestError>::new("Checkout")
        .activity("reserve", || async { Ok(SagaResult::success(3_u32)) })
        .activity("charge", || async {
            Ok(SagaResult::success(Receipt { amount_cents: 1299 }))
        })
        .activity("label", || async {
            Ok(SagaResult::failure("printer offline".to_string()))
        })
        .build()?;

    saga.execute().await?;

    let ledger = saga.ledger();
    assert_eq!(ledger.records()[0].result().payload::<u32>(), Some(&3));
    assert_eq!(
        ledger.records()[1].result().downcast::<Receipt>()?,
        SagaResult::success(Receipt { amount_cents: 1299 })
    );
    assert!(ledger.records()[2].result().payload::<u32>().is_none());
    assert_eq!(ledger.summary(), "✓ reserve\n✓ charge\n✗ label");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn saga_runs_on_multi_threaded_runtime() -> anyhow::Result<()> {
    let mut saga = SagaBuilder::<TestError>::new("Spawned")
        .activity("yield", || async {
            tokio::task::yield_now().await;
            Ok(SagaResult::success(()))
        })
        .build()?;

    let saga = tokio::spawn(async move {
        let outcome = saga.execute().await;
        (saga, outcome)
    });
    let (saga, outcome) = saga.await?;
    outcome?;

    assert_eq!(saga.state(), SagaState::Completed);
    Ok(())
}
