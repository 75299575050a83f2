use std::any::type_name;
use std::fmt;

use crate::error::PayloadMismatch;
use crate::payload::ErasedPayload;

/// Outcome of an activity: a business success flag and a typed payload.
///
/// `success == false` is a business failure. It is reported by an activity
/// that itself completed normally, and it is the only thing that triggers
/// compensation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaResult<T> {
    success: bool,
    payload: T,
}

impl<T> SagaResult<T> {
    #[must_use]
    pub fn new(success: bool, payload: T) -> Self {
        Self { success, payload }
    }

    /// Result reporting business success.
    #[must_use]
    pub fn success(payload: T) -> Self {
        Self::new(true, payload)
    }

    /// Result reporting business failure.
    #[must_use]
    pub fn failure(payload: T) -> Self {
        Self::new(false, payload)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T> SagaResult<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn erase(self) -> ErasedResult {
        ErasedResult {
            success: self.success,
            payload: Box::new(self.payload),
        }
    }
}

/// A [`SagaResult`] whose payload type has been erased.
///
/// This is what the ledger stores, since activities of one saga may produce
/// different payload types. The payload can be recovered with
/// [`payload`](Self::payload) or [`downcast`](Self::downcast).
pub struct ErasedResult {
    success: bool,
    payload: Box<dyn ErasedPayload>,
}

impl ErasedResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Name of the concrete payload type, as reported by `std::any::type_name`.
    #[must_use]
    pub fn payload_type_name(&self) -> &'static str {
        self.payload.type_name()
    }

    /// Borrow the payload if it is of type `T`.
    #[must_use]
    pub fn payload<T: 'static>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }

    /// Recover a typed copy of this result.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadMismatch`] if the payload is not of type `T`.
    pub fn downcast<T: Clone + 'static>(&self) -> Result<SagaResult<T>, PayloadMismatch> {
        self.payload::<T>()
            .map(|payload| SagaResult::new(self.success, payload.clone()))
            .ok_or_else(|| self.mismatch::<T>())
    }

    pub(crate) fn into_typed<T: 'static>(self) -> Result<SagaResult<T>, PayloadMismatch> {
        let mismatch = self.mismatch::<T>();
        let success = self.success;
        self.payload
            .into_any()
            .downcast::<T>()
            .map(|payload| SagaResult::new(success, *payload))
            .map_err(|_| mismatch)
    }

    fn mismatch<T>(&self) -> PayloadMismatch {
        PayloadMismatch {
            expected: type_name::<T>(),
            actual: self.payload_type_name(),
        }
    }
}

impl Clone for ErasedResult {
    fn clone(&self) -> Self {
        Self {
            success: self.success,
            payload: self.payload.clone_box(),
        }
    }
}

impl fmt::Debug for ErasedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedResult")
            .field("success", &self.success)
            .field("payload_type", &self.payload_type_name())
            .finish_non_exhaustive()
    }
}
