use sol_saga::{BuildError, ConfigError, SagaError};
use thiserror::Error;

use crate::order::OrderError;

#[derive(Debug, Error)]
pub(crate) enum DemoError {
    #[error("failed to start async runtime")]
    Runtime(#[source] std::io::Error),

    #[error("invalid saga configuration")]
    Config(#[from] ConfigError),

    #[error("failed to build saga")]
    Build(#[from] BuildError),

    #[error("saga execution failed")]
    Saga(#[from] SagaError<OrderError>),
}
