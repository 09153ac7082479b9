//! SQLite-backed implementation of the storage layer.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod sqlite;

pub use sqlite::SqliteDelegationStore;
