//! The crank node's heart: the epoch-driven scheduler and batch executor.
//!
//! On a fixed timer the [`CrankScheduler`] asks the epoch clock whether each
//! crank family is due, takes the global run-guard, and drives the family's
//! work to completion: a paginated batch over delegation records for most
//! families, a sequential pass over the configured validator set for stake
//! reserve. The guard, not the timer, is the serialization mechanism.

pub mod batch;
pub mod errors;
pub mod scheduler;
pub mod status;

pub use batch::{BatchExecutor, BatchReport};
pub use errors::BatchError;
pub use scheduler::{CrankScheduler, SchedulerConfig};
pub use status::ExecutionState;
