use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};

use crate::config::SagaConfig;
use crate::erased::{ErasedActivity, InvocationError};
use crate::error::SagaError;
use crate::ledger::ResultLedger;

/// Lifecycle of a built saga.
///
/// Registration happens on [`SagaBuilder`](crate::SagaBuilder) before a saga
/// exists, so a saga starts out `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SagaState {
    /// Built and not yet executed.
    Ready,
    /// Execution started and has not finished. A saga stays here if its
    /// execution future is dropped.
    Executing,
    /// Every activity ran; business failures were compensated.
    Completed,
    /// A technical failure aborted execution.
    Failed,
    /// Execution was stopped through the cancellation token.
    Cancelled,
}

impl fmt::Display for SagaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ready => "ready",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// A built saga ready for execution.
///
/// Activities run one at a time in registration order. An activity that
/// reports business failure (`success == false`) has its compensations run in
/// registration order, and execution then continues with the next activity.
/// An activity or compensation that returns an error aborts the saga.
pub struct Saga<Err> {
    name: String,
    activities: Vec<Box<dyn ErasedActivity<Err>>>,
    ledger: ResultLedger,
    state: SagaState,
    config: SagaConfig,
}

impl<Err> Saga<Err> {
    pub(crate) fn from_parts(
        name: String,
        activities: Vec<Box<dyn ErasedActivity<Err>>>,
        config: SagaConfig,
    ) -> Self {
        Self {
            name,
            activities,
            ledger: ResultLedger::new(),
            state: SagaState::Ready,
            config,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Results recorded so far, in execution order.
    #[must_use]
    pub fn ledger(&self) -> &ResultLedger {
        &self.ledger
    }

    #[must_use]
    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Registered activity names, in execution order.
    pub fn activity_names(&self) -> impl Iterator<Item = &str> {
        self.activities.iter().map(|activity| activity.name())
    }

    /// Payload type of each registered activity, in execution order.
    pub fn activity_payload_types(&self) -> impl Iterator<Item = &'static str> {
        self.activities
            .iter()
            .map(|activity| activity.payload_type_name())
    }
}

impl<Err> Saga<Err>
where
    Err: fmt::Display + Send + 'static,
{
    /// Run every activity once, in registration order.
    ///
    /// # Errors
    ///
    /// See [`execute_with_cancellation`](Self::execute_with_cancellation).
    pub async fn execute(&mut self) -> Result<(), SagaError<Err>> {
        self.execute_with_cancellation(&CancellationToken::new())
            .await
    }

    /// Run every activity once, stopping early if `cancel` fires.
    ///
    /// The token is checked before each activity starts and raced against
    /// every activity and compensation invocation; a cancelled invocation's
    /// future is dropped.
    ///
    /// # Errors
    ///
    /// - [`SagaError::InvalidState`] if the saga is not `Ready`.
    /// - [`SagaError::ActivityFailed`] / [`SagaError::ActivityTimedOut`] if an
    ///   activity did not return a result. It gets no ledger entry and nothing
    ///   after it runs.
    /// - [`SagaError::CompensationFailed`], [`SagaError::CompensationTimedOut`]
    ///   or [`SagaError::PayloadTypeMismatch`] if a compensation did not
    ///   complete. The compensated activity keeps its ledger entry.
    /// - [`SagaError::Cancelled`] if `cancel` fired.
    pub async fn execute_with_cancellation(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<(), SagaError<Err>> {
        if self.state != SagaState::Ready {
            return Err(SagaError::InvalidState {
                expected: SagaState::Ready,
                actual: self.state,
            });
        }

        self.state = SagaState::Executing;
        let span = info_span!("saga", saga = %self.name);
        let outcome = self.run(cancel).instrument(span).await;

        self.state = match &outcome {
            Ok(()) => SagaState::Completed,
            Err(SagaError::Cancelled { .. }) => SagaState::Cancelled,
            Err(_) => SagaState::Failed,
        };
        info!(saga = %self.name, state = %self.state, records = self.ledger.len(), "saga finished");
        outcome
    }

    async fn run(&mut self, cancel: &CancellationToken) -> Result<(), SagaError<Err>> {
        let timeout = self.config.activity_timeout();
        info!(activities = self.activities.len(), "executing saga");

        for activity in &self.activities {
            let activity_name = activity.name();

            if cancel.is_cancelled() {
                info!(activity = activity_name, "cancelled before activity");
                return Err(SagaError::Cancelled {
                    activity: activity_name.to_string(),
                });
            }

            debug!(activity = activity_name, "invoking activity");
            let result = match guarded(activity.invoke(), cancel, timeout).await {
                Guarded::Finished(Ok(result)) => result,
                Guarded::Finished(Err(source)) => {
                    error!(activity = activity_name, error = %source, "activity failed");
                    return Err(SagaError::ActivityFailed {
                        activity: activity_name.to_string(),
                        source,
                    });
                }
                Guarded::TimedOut(after) => {
                    error!(activity = activity_name, ?after, "activity timed out");
                    return Err(SagaError::ActivityTimedOut {
                        activity: activity_name.to_string(),
                        after,
                    });
                }
                Guarded::Cancelled => {
                    info!(activity = activity_name, "cancelled during activity");
                    return Err(SagaError::Cancelled {
                        activity: activity_name.to_string(),
                    });
                }
            };

            let success = result.is_success();
            debug!(activity = activity_name, success, "activity returned");
            self.ledger.append(activity_name, result.clone());

            if success {
                continue;
            }

            // Business failure: compensate, then carry on with the next activity.
            for compensation in activity.compensations() {
                let compensation_name = compensation.name();
                debug!(
                    activity = activity_name,
                    compensation = compensation_name,
                    "invoking compensation"
                );
                match guarded(compensation.invoke(result.clone()), cancel, timeout).await {
                    Guarded::Finished(Ok(())) => {}
                    Guarded::Finished(Err(InvocationError::Raised(source))) => {
                        error!(
                            activity = activity_name,
                            compensation = compensation_name,
                            error = %source,
                            "compensation failed"
                        );
                        return Err(SagaError::CompensationFailed {
                            activity: activity_name.to_string(),
                            compensation: compensation_name.to_string(),
                            source,
                        });
                    }
                    Guarded::Finished(Err(InvocationError::PayloadMismatch(source))) => {
                        error!(
                            activity = activity_name,
                            compensation = compensation_name,
                            error = %source,
                            "compensation payload mismatch"
                        );
                        return Err(SagaError::PayloadTypeMismatch {
                            activity: activity_name.to_string(),
                            compensation: compensation_name.to_string(),
                            source,
                        });
                    }
                    Guarded::TimedOut(after) => {
                        error!(
                            activity = activity_name,
                            compensation = compensation_name,
                            ?after,
                            "compensation timed out"
                        );
                        return Err(SagaError::CompensationTimedOut {
                            activity: activity_name.to_string(),
                            compensation: compensation_name.to_string(),
                            after,
                        });
                    }
                    Guarded::Cancelled => {
                        info!(
                            activity = activity_name,
                            compensation = compensation_name,
                            "cancelled during compensation"
                        );
                        return Err(SagaError::Cancelled {
                            activity: activity_name.to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

enum Guarded<T> {
    Finished(T),
    TimedOut(Duration),
    Cancelled,
}

async fn guarded<F>(
    invocation: F,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> Guarded<F::Output>
where
    F: Future,
{
    let bounded = async {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, invocation).await {
                Ok(output) => Guarded::Finished(output),
                Err(_) => Guarded::TimedOut(limit),
            },
            None => Guarded::Finished(invocation.await),
        }
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Guarded::Cancelled,
        outcome = bounded => outcome,
    }
}
