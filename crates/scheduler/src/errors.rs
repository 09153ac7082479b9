//! Family-level execution errors.

use crank_db::errors::DbError;
use thiserror::Error;

/// An error that aborts a whole batch pass.
///
/// Per-record submission failures never surface here; only the page source
/// going away can fail a batch. The scheduler catches this at the family
/// level, resets the shared flags, and leaves the family eligible for a retry
/// on a later tick within the same epoch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The delegation page source failed.
    #[error("page source: {0}")]
    PageSource(#[from] DbError),
}
