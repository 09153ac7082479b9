//! Epoch clock for the crank node.
//!
//! Computes epoch progress and the target-slot countdown that decides when a
//! crank family is due, from a [`LedgerSource`] that can be backed by a real
//! RPC endpoint or a mock in tests.

pub mod clock;
pub mod errors;
pub mod ledger;

pub use clock::{ClockReader, EpochProgress, EpochWindow, TargetSlot};
pub use errors::ClockError;
pub use ledger::{LedgerSource, SolanaLedger};
