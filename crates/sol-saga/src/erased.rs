use std::any::{Any, type_name};
use std::future::Future;

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::PayloadMismatch;
use crate::result::{ErasedResult, SagaResult};

type ActivityFn<T, Err> =
    Box<dyn Fn() -> BoxFuture<'static, Result<SagaResult<T>, Err>> + Send + Sync>;

type CompensationFn<T, Err> =
    Box<dyn Fn(SagaResult<T>) -> BoxFuture<'static, Result<(), Err>> + Send + Sync>;

type ErasedCompensationFn<'a, Err> = Box<
    dyn Fn(ErasedResult) -> BoxFuture<'static, Result<(), InvocationError<Err>>> + Send + Sync + 'a,
>;

/// Failure of an erased compensation invocation.
pub(crate) enum InvocationError<Err> {
    /// The handler itself returned an error.
    Raised(Err),
    /// The erased payload could not be turned back into the handler's type.
    PayloadMismatch(PayloadMismatch),
}

/// Uniform view over activities of any payload type.
pub(crate) trait ErasedActivity<Err>: Send + Sync {
    fn name(&self) -> &str;

    fn payload_type_name(&self) -> &'static str;

    fn invoke(&self) -> BoxFuture<'static, Result<ErasedResult, Err>>;

    fn compensations(&self) -> Vec<ErasedCompensation<'_, Err>>;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A compensation handler that accepts an erased result.
pub(crate) struct ErasedCompensation<'a, Err> {
    name: &'a str,
    invoker: ErasedCompensationFn<'a, Err>,
}

impl<'a, Err> ErasedCompensation<'a, Err> {
    pub(crate) fn name(&self) -> &'a str {
        self.name
    }

    pub(crate) fn invoke(
        &self,
        result: ErasedResult,
    ) -> BoxFuture<'static, Result<(), InvocationError<Err>>> {
        (self.invoker)(result)
    }
}

struct CompensationHandler<T, Err> {
    name: String,
    action: CompensationFn<T, Err>,
}

/// An activity with a concrete payload type and its compensations.
pub(crate) struct TypedActivity<T, Err> {
    name: String,
    action: ActivityFn<T, Err>,
    compensations: Vec<CompensationHandler<T, Err>>,
}

impl<T, Err> TypedActivity<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Send + 'static,
{
    pub(crate) fn new<F, Fut>(name: String, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SagaResult<T>, Err>> + Send + 'static,
    {
        Self {
            name,
            action: Box::new(move || action().boxed()),
            compensations: Vec::new(),
        }
    }

    pub(crate) fn push_compensation<F, Fut>(&mut self, name: String, handler: F)
    where
        F: Fn(SagaResult<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Err>> + Send + 'static,
    {
        self.compensations.push(CompensationHandler {
            name,
            action: Box::new(move |result| handler(result).boxed()),
        });
    }
}

impl<T, Err> ErasedActivity<Err> for TypedActivity<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn payload_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn invoke(&self) -> BoxFuture<'static, Result<ErasedResult, Err>> {
        (self.action)()
            .map(|outcome| outcome.map(SagaResult::erase))
            .boxed()
    }

    fn compensations(&self) -> Vec<ErasedCompensation<'_, Err>> {
        self.compensations
            .iter()
            .map(|handler| {
                let invoker: ErasedCompensationFn<'_, Err> =
                    Box::new(move |result: ErasedResult| match result.into_typed::<T>() {
                        Ok(typed) => (handler.action)(typed)
                            .map(|outcome| outcome.map_err(InvocationError::Raised))
                            .boxed(),
                        Err(mismatch) => {
                            future::ready(Err(InvocationError::PayloadMismatch(mismatch))).boxed()
                        }
                    });
                ErasedCompensation {
                    name: &handler.name,
                    invoker,
                }
            })
            .collect()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
