use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::saga::SagaState;

/// A type-erased payload was not of the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payload is of type '{actual}', expected '{expected}'")]
pub struct PayloadMismatch {
    /// Type that was requested.
    pub expected: &'static str,
    /// Type that is actually stored.
    pub actual: &'static str,
}

/// Technical failure that aborted saga execution.
///
/// Business failures (`success == false`) never appear here; they are
/// recorded in the ledger and compensated.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SagaError<E> {
    /// An activity returned an error instead of a result.
    #[error("activity '{activity}' failed")]
    ActivityFailed {
        /// Name of the activity that failed.
        activity: String,
        /// The error returned by the activity.
        #[source]
        source: E,
    },

    /// An activity did not finish within the configured timeout.
    #[error("activity '{activity}' timed out after {after:?}")]
    ActivityTimedOut {
        /// Name of the activity that timed out.
        activity: String,
        /// The configured limit.
        after: Duration,
    },

    /// A compensation handler returned an error.
    #[error("compensation '{compensation}' of activity '{activity}' failed")]
    CompensationFailed {
        /// Name of the activity being compensated.
        activity: String,
        /// Name of the compensation that failed.
        compensation: String,
        /// The error returned by the handler.
        #[source]
        source: E,
    },

    /// A compensation handler did not finish within the configured timeout.
    #[error("compensation '{compensation}' of activity '{activity}' timed out after {after:?}")]
    CompensationTimedOut {
        /// Name of the activity being compensated.
        activity: String,
        /// Name of the compensation that timed out.
        compensation: String,
        /// The configured limit.
        after: Duration,
    },

    /// A compensation handler was given a payload it cannot accept.
    #[error("compensation '{compensation}' of activity '{activity}' received a mismatched payload")]
    PayloadTypeMismatch {
        /// Name of the activity being compensated.
        activity: String,
        /// Name of the compensation.
        compensation: String,
        /// Expected and actual payload types.
        #[source]
        source: PayloadMismatch,
    },

    /// Execution was cancelled through its cancellation token.
    #[error("saga cancelled at activity '{activity}'")]
    Cancelled {
        /// Activity that was about to run, or was running, when cancelled.
        activity: String,
    },

    /// The saga is not in a state that allows execution.
    #[error("saga cannot execute in state '{actual}', expected '{expected}'")]
    InvalidState {
        /// State required for the operation.
        expected: SagaState,
        /// State the saga was in.
        actual: SagaState,
    },
}

/// Error from building a saga.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// Strict registration is enabled and a compensation matched no activity.
    #[error(
        "compensation '{compensation}' matches no activity named '{activity}' with payload type '{payload_type}'"
    )]
    UnmatchedCompensation {
        /// Activity name the compensation was registered against.
        activity: String,
        /// Name of the compensation.
        compensation: String,
        /// Payload type the compensation handler accepts.
        payload_type: &'static str,
    },
}

/// Error from loading saga configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config at '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error")]
    Parse(#[from] toml::de::Error),

    #[error("'{key}' must be greater than zero")]
    ZeroValue { key: &'static str },
}
