//! Sequential saga orchestration.
//!
//! A saga is a named, ordered list of asynchronous activities. Each activity
//! produces a [`SagaResult`] carrying a business success flag and a typed
//! payload. When an activity reports business failure, the compensations
//! registered against it run in registration order and the saga moves on to
//! the next activity. An activity that returns an error aborts the saga.
//!
//! Every returned result is recorded in the saga's [`ResultLedger`].
//!
//! ```
//! use sol_saga::{SagaBuilder, SagaResult};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut saga = SagaBuilder::<std::io::Error>::new("Order")
//!     .activity("Order-Process", || async {
//!         Ok(SagaResult::success("My-Order-Complete".to_string()))
//!     })
//!     .compensation_activity("Order-Process", "Refund", |result: SagaResult<String>| async move {
//!         println!("refunding {}", result.payload());
//!         Ok(())
//!     })
//!     .build()?;
//!
//! saga.execute().await?;
//!
//! let record = saga.ledger().find("Order-Process", true).expect("recorded");
//! assert_eq!(
//!     record.result().payload::<String>().map(String::as_str),
//!     Some("My-Order-Complete")
//! );
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod erased;
mod error;
mod ledger;
mod payload;
mod result;
mod saga;

pub use builder::{SagaBuilder, UnmatchedCompensation};
pub use config::SagaConfig;
pub use error::{BuildError, ConfigError, PayloadMismatch, SagaError};
pub use ledger::{ActivityRecord, ResultLedger};
pub use result::{ErasedResult, SagaResult};
pub use saga::{Saga, SagaState};
pub use tokio_util::sync::CancellationToken;
