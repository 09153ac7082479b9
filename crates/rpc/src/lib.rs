//! RPC interface of the crank node.
//!
//! High-level traits implemented by the node's RPC server, split into a
//! control group (about the client itself) and a monitoring group (about the
//! scheduler and the epoch clock). With the `client` feature enabled the
//! proc-macro also generates typed clients for operator tooling.

pub mod traits;
pub mod types;
