//! Storage layer for the crank node.
//!
//! The scheduler reads stake delegation records through the [`DelegationStore`]
//! trait. The backing table is written by the (external) event-ingestion
//! pipeline; this crate only ever reads it, apart from an insert helper used
//! by tests and operator tooling.

pub mod delegation;
pub mod errors;
pub mod inmemory;
pub mod persistent;

pub use delegation::DelegationStore;
