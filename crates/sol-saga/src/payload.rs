use std::any::{Any, type_name};

/// Type-erased activity payload.
///
/// Combines `Any` with clone and type-name capabilities so payloads of
/// different activities can live in one ledger and still be recovered as
/// their concrete type.
pub(crate) trait ErasedPayload: Any + Send + Sync {
    /// Clone the value into a new boxed trait object.
    fn clone_box(&self) -> Box<dyn ErasedPayload>;

    /// Borrow as `Any` for reference downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Convert into a boxed `Any` for owned downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;

    /// Name of the concrete payload type.
    fn type_name(&self) -> &'static str;
}

impl<T> ErasedPayload for T
where
    T: Clone + Send + Sync + 'static,
{
    fn clone_box(&self) -> Box<dyn ErasedPayload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}
