//! Shared vocabulary types for the crank node.
//!
//! These types are deliberately free of any ledger SDK so that the scheduler
//! and its collaborators can be exercised in tests without a ledger.

pub mod delegation;
pub mod operations;
pub mod status;
