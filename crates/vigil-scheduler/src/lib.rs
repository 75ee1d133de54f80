//! Vigil Scheduler - fixed-delay polling for queue workers.
//!
//! The worker's only recurring job is "process one queued run if any". It is
//! driven by [`FixedDelay`], which sleeps a fixed interval *after* each tick
//! so ticks never overlap, and stops when its cancellation token fires.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod scheduler;

// Re-export commonly used types
pub use scheduler::{FixedDelay, TickStats};
pub use tokio_util::sync::CancellationToken;
