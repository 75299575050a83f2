use std::any::type_name;
use std::future::Future;

use tracing::{debug, warn};

use crate::config::SagaConfig;
use crate::erased::{ErasedActivity, TypedActivity};
use crate::error::BuildError;
use crate::result::SagaResult;
use crate::saga::Saga;

/// A compensation registration that matched no activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedCompensation {
    /// Activity name the compensation was registered against.
    pub activity: String,
    /// Name of the compensation.
    pub compensation: String,
    /// Payload type the compensation handler accepts.
    pub payload_type: &'static str,
}

/// Registration phase of a saga.
///
/// Activities run in the order they are registered. Compensations are
/// attached by activity name and payload type. Once [`build`](Self::build)
/// has produced a [`Saga`], nothing more can be registered:
///
/// ```compile_fail
/// use sol_saga::{SagaBuilder, SagaResult};
///
/// let mut saga = SagaBuilder::<std::io::Error>::new("Order")
///     .activity("Order-Process", || async { Ok(SagaResult::success(1_u8)) })
///     .build()
///     .unwrap();
///
/// // `Saga` has no registration methods.
/// saga.activity("Late", || async { Ok(SagaResult::success(2_u8)) });
/// ```
pub struct SagaBuilder<Err> {
    name: String,
    activities: Vec<Box<dyn ErasedActivity<Err>>>,
    unmatched: Vec<UnmatchedCompensation>,
    config: SagaConfig,
}

impl<Err> SagaBuilder<Err>
where
    Err: Send + 'static,
{
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activities: Vec::new(),
            unmatched: Vec::new(),
            config: SagaConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SagaConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an activity producing a `SagaResult<T>`.
    ///
    /// Always succeeds. Duplicate names are allowed.
    #[must_use]
    pub fn activity<T, F, Fut>(mut self, name: impl Into<String>, action: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SagaResult<T>, Err>> + Send + 'static,
    {
        let name = name.into();
        debug!(saga = %self.name, activity = %name, payload = type_name::<T>(), "registered activity");
        self.activities
            .push(Box::new(TypedActivity::new(name, action)));
        self
    }

    /// Attach a compensation handler to an activity.
    ///
    /// The handler goes to the first registered activity whose name equals
    /// `activity_name` and whose payload type is `T`. Handlers of one activity
    /// run in registration order.
    ///
    /// If no activity matches, the call has no effect and does not fail. The
    /// registration is logged and kept in
    /// [`unmatched_compensations`](Self::unmatched_compensations); with
    /// [`SagaConfig::strict_compensation_registration`] enabled,
    /// [`build`](Self::build) rejects it.
    #[must_use]
    pub fn compensation_activity<T, F, Fut>(
        mut self,
        activity_name: &str,
        compensation_name: impl Into<String>,
        handler: F,
    ) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(SagaResult<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Err>> + Send + 'static,
    {
        let compensation_name = compensation_name.into();
        let target = self
            .activities
            .iter_mut()
            .filter_map(|activity| {
                activity
                    .as_any_mut()
                    .downcast_mut::<TypedActivity<T, Err>>()
            })
            .find(|activity| activity.name() == activity_name);

        if let Some(activity) = target {
            debug!(
                saga = %self.name,
                activity = activity_name,
                compensation = %compensation_name,
                "registered compensation"
            );
            activity.push_compensation(compensation_name, handler);
        } else {
            warn!(
                saga = %self.name,
                activity = activity_name,
                compensation = %compensation_name,
                payload = type_name::<T>(),
                "compensation matches no activity"
            );
            self.unmatched.push(UnmatchedCompensation {
                activity: activity_name.to_string(),
                compensation: compensation_name,
                payload_type: type_name::<T>(),
            });
        }
        self
    }

    /// Compensation registrations that matched no activity so far.
    #[must_use]
    pub fn unmatched_compensations(&self) -> &[UnmatchedCompensation] {
        &self.unmatched
    }

    /// Finish registration.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnmatchedCompensation`] for the first unmatched
    /// registration when strict compensation registration is enabled.
    pub fn build(self) -> Result<Saga<Err>, BuildError> {
        if self.config.strict_compensation_registration() {
            if let Some(unmatched) = self.unmatched.into_iter().next() {
                return Err(BuildError::UnmatchedCompensation {
                    activity: unmatched.activity,
                    compensation: unmatched.compensation,
                    payload_type: unmatched.payload_type,
                });
            }
        }

        Ok(Saga::from_parts(self.name, self.activities, self.config))
    }
}
