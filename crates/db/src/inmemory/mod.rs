//! In-memory implementation of the storage layer, for tests and dev mode.

pub mod delegation;

pub use delegation::InMemoryDelegationStore;
