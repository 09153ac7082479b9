//! Errors for the epoch clock.

use thiserror::Error;

/// Errors that can occur when reading the ledger clock.
///
/// There are no retries at this layer; callers decide whether to skip a tick
/// or fail.
#[derive(Debug, Clone, Error)]
pub enum ClockError {
    /// The underlying ledger query failed or timed out.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// The ledger returned structurally invalid epoch data.
    #[error("invalid epoch info: {0}")]
    InvalidEpochInfo(String),
}
