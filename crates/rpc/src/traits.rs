//! Traits for the RPC server.

use crank_primitives::operations::CrankFamily;
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

use crate::types::{RpcCrankStatus, RpcEpochProgress, RpcTargetSlot};

/// RPCs related to information about the client itself.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "crank"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "crank"))]
pub trait CrankControlApi {
    /// Get the uptime for the client in seconds assuming the clock is strictly monotonically
    /// increasing.
    #[method(name = "uptime")]
    async fn get_uptime(&self) -> RpcResult<u64>;
}

/// RPCs for monitoring and steering the crank scheduler.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "crank"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "crank"))]
pub trait CrankMonitoringApi {
    /// Get a snapshot of which crank operations are currently running.
    #[method(name = "executionStatus")]
    async fn get_execution_status(&self) -> RpcResult<RpcCrankStatus>;

    /// Get the ledger's position within the current epoch.
    #[method(name = "epochProgress")]
    async fn get_epoch_progress(&self) -> RpcResult<RpcEpochProgress>;

    /// Get the countdown to the execution slot for the given lookback window.
    #[method(name = "targetSlot")]
    async fn get_target_slot(&self, lookback_slots: u64) -> RpcResult<RpcTargetSlot>;

    /// Queue one crank family for immediate execution, bypassing the
    /// target-slot check but not the run-guard or the once-per-epoch rule.
    ///
    /// Returns `true` if the trigger was queued.
    #[method(name = "triggerCrank")]
    async fn trigger_crank(&self, family: CrankFamily) -> RpcResult<bool>;
}
