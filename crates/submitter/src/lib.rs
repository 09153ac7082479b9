//! Builds, signs, and submits crank transactions against the staking program.
//!
//! The scheduler talks to this crate through the [`TxSubmitter`] trait so it
//! can be tested without a ledger. The real implementation wraps a Solana RPC
//! client and the protocol's fixed account registry.

pub mod accounts;
pub mod errors;
pub mod instructions;
pub mod submitter;
pub mod target;

pub use accounts::{ProtocolAccounts, ProtocolAccountsConfig};
pub use errors::SubmitError;
pub use submitter::{SolanaSubmitter, TxSubmitter};
pub use target::CrankTarget;
