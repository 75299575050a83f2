use clap::ValueEnum;
use sol_saga::{BuildError, Saga, SagaBuilder, SagaConfig, SagaResult};
use thiserror::Error;
use tracing::info;

pub(crate) const ORDER_ACTIVITY: &str = "Order-Process";
pub(crate) const ORDER_COMPLETE: &str = "My-Order-Complete";
pub(crate) const ORDER_PARTIAL: &str = "partial";

/// What the order service reports when the saga runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Outcome {
    /// The order completes.
    Success,
    /// The order is only partially processed and must be compensated.
    BusinessFailure,
    /// The order service cannot be reached.
    TechnicalFailure,
}

#[derive(Debug, Error)]
pub(crate) enum OrderError {
    #[error("order service unavailable")]
    ServiceUnavailable,
}

/// The sample saga: one order activity with two compensations.
pub(crate) fn order_saga(
    name: &str,
    outcome: Outcome,
    config: SagaConfig,
) -> Result<Saga<OrderError>, BuildError> {
    let mut builder = SagaBuilder::new(name)
        .with_config(config)
        .activity(ORDER_ACTIVITY, move || async move {
            info!(?outcome, "processing order");
            match outcome {
                Outcome::Success => Ok(SagaResult::success(ORDER_COMPLETE.to_string())),
                Outcome::BusinessFailure => Ok(SagaResult::failure(ORDER_PARTIAL.to_string())),
                Outcome::TechnicalFailure => Err(OrderError::ServiceUnavailable),
            }
        });

    for compensation in ["Compensation-1", "Compensation-2"] {
        builder = builder.compensation_activity(
            ORDER_ACTIVITY,
            compensation,
            move |result: SagaResult<String>| async move {
                // Handlers stay safe to call with a successful result.
                if !result.is_success() {
                    println!(
                        "{compensation}: compensating {ORDER_ACTIVITY} failure. Original result was: {}",
                        result.payload()
                    );
                }
                Ok(())
            },
        );
    }

    builder.build()
}
