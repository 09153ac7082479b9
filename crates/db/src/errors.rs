//! Storage errors.

use thiserror::Error;

use crate::persistent::errors::StorageError;

/// Errors that can occur when reading delegation records.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error in the SQLite-backed store.
    #[error("sqlite: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;
