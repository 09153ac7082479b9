//! Submission errors.
//!
//! All of these are per-record failures: the batch executor logs them and
//! moves on, they never abort a crank family.

use solana_sdk::signature::Signature;
use thiserror::Error;

/// Errors that can occur when building or submitting a crank transaction.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The RPC call failed.
    #[error("rpc: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    /// An RPC call did not return within the configured bound.
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// The transaction was sent but not confirmed before the deadline.
    #[error("transaction {0} not confirmed before deadline")]
    Unconfirmed(Signature),

    /// A configured protocol account address failed to parse.
    #[error("invalid {name} address: {reason}")]
    InvalidAddress {
        /// The config field that failed to parse.
        name: &'static str,
        /// Why the address was rejected.
        reason: String,
    },

    /// The delegation record or target cannot be turned into a transaction.
    #[error("unusable target: {0}")]
    InvalidTarget(String),
}
