//! Integration tests for activity and compensation registration.

use std::sync::{Arc, Mutex};

use sol_saga::{BuildError, SagaBuilder, SagaConfig, SagaResult};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

type CallLog = Arc<Mutex<Vec<String>>>;

fn logging_compensation(
    log: &CallLog,
    label: &'static str,
) -> impl Fn(SagaResult<String>) -> std::future::Ready<Result<(), TestError>> + Send + Sync + 'static
{
    let log = Arc::clone(log);
    move |result| {
        log.lock()
            .expect("lock")
            .push(format!("{label}:{}", result.payload()));
        std::future::ready(Ok(()))
    }
}

#[tokio::test]
async fn unknown_activity_name_is_a_silent_no_op() -> anyhow::Result<()> {
    let log = CallLog::default();
    let builder = SagaBuilder::<TestError>::new("Order")
        .activity("Order-Process", || async {
            Ok(SagaResult::failure("partial".to_string()))
        })
        .compensation_activity("Order-Processing", "typo", logging_compensation(&log, "typo"));
    assert_eq!(builder.unmatched_compensations().len(), 1);
    let mut saga = builder.build()?;

    saga.execute().await?;

    assert!(log.lock().expect("lock").is_empty());
    assert_eq!(saga.ledger().len(), 1);
    let record = saga
        .ledger()
        .first_by_name("Order-Process")
        .expect("record exists");
    assert_eq!(
        record.result().payload::<String>().map(String::as_str),
        Some("partial")
    );
    Ok(())
}

#[tokio::test]
async fn compensation_registered_before_activity_does_not_attach() -> anyhow::Result<()> {
    let log = CallLog::default();
    let mut saga = SagaBuilder::<TestError>::new("Order")
        .compensation_activity("late", "early-bird", logging_compensation(&log, "early-bird"))
        .activity("late", || async {
            Ok(SagaResult::failure("x".to_string()))
        })
        .build()?;

    saga.execute().await?;

    assert!(log.lock().expect("lock").is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_names_attach_compensation_to_first_only() -> anyhow::Result<()> {
    let log = CallLog::default();
    let mut saga = SagaBuilder::<TestError>::new("Twins")
        .activity("twin", || async {
            Ok(SagaResult::failure("first".to_string()))
        })
        .activity("twin", || async {
            Ok(SagaResult::failure("second".to_string()))
        })
        .compensation_activity("twin", "undo", logging_compensation(&log, "undo"))
        .build()?;

    saga.execute().await?;

    assert_eq!(*log.lock().expect("lock"), vec!["undo:first"]);
    assert_eq!(saga.ledger().len(), 2);
    Ok(())
}

#[tokio::test]
async fn duplicate_names_with_different_payloads_match_by_type() -> anyhow::Result<()> {
    let log = CallLog::default();
    let mut saga = SagaBuilder::<TestError>::new("Twins")
        .activity("twin", || async { Ok(SagaResult::failure(7_u8)) })
        .activity("twin", || async {
            Ok(SagaResult::failure("text".to_string()))
        })
        .compensation_activity("twin", "undo", logging_compensation(&log, "undo"))
        .build()?;

    saga.execute().await?;

    assert_eq!(*log.lock().expect("lock"), vec!["undo:text"]);
    Ok(())
}

#[test]
fn strict_configuration_rejects_unmatched_compensation() {
    let log = CallLog::default();
    let result = SagaBuilder::<TestError>::new("Order")
        .with_config(SagaConfig::default().with_strict_compensation_registration(true))
        .activity("Order-Process", || async {
            Ok(SagaResult::success("done".to_string()))
        })
        .compensation_activity("Order-Processing", "typo", logging_compensation(&log, "typo"))
        .build();

    match result {
        Err(BuildError::UnmatchedCompensation {
            activity,
            compensation,
            payload_type,
        }) => {
            assert_eq!(activity, "Order-Processing");
            assert_eq!(compensation, "typo");
            assert_eq!(payload_type, std::any::type_name::<String>());
        }
        Err(other) => panic!("unexpected build error: {other}"),
        Ok(_) => panic!("strict build should reject unmatched compensation"),
    }
}

#[test]
fn strict_configuration_from_toml() -> anyhow::Result<()> {
    let config = SagaConfig::from_toml_str("[saga]\nstrict-compensation-registration = true\n")?;

    let result = SagaBuilder::<TestError>::new("Order")
        .with_config(config)
        .compensation_activity(
            "missing",
            "typo",
            logging_compensation(&CallLog::default(), "typo"),
        )
        .build();

    assert!(result.is_err());
    Ok(())
}
