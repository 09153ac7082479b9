//! Types for the RPC server.

use chrono::{DateTime, Utc};
use crank_epoch::{EpochProgress, TargetSlot};
use crank_primitives::{operations::CrankOperation, status::CrankExecutionStatus};
use serde::{Deserialize, Serialize};

/// The scheduler's execution status as served over RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcCrankStatus {
    /// Whether the deactivate-stake batch is running.
    pub is_deactivate_stake_running: bool,

    /// Whether the stake-reserve loop is running.
    pub is_stake_reserve_running: bool,

    /// Whether the update-active batch is running.
    pub is_update_active_running: bool,

    /// Whether the update-deactivated batch is running.
    pub is_update_deactivated_running: bool,

    /// Whether any crank family currently holds the run-guard.
    pub is_any_process_running: bool,

    /// The operation currently in flight, if any.
    pub current_operation: Option<CrankOperation>,

    /// When a crank family last finished, if one has.
    pub last_execution_time: Option<DateTime<Utc>>,
}

impl From<CrankExecutionStatus> for RpcCrankStatus {
    fn from(status: CrankExecutionStatus) -> Self {
        Self {
            is_deactivate_stake_running: status.is_deactivate_stake_running,
            is_stake_reserve_running: status.is_stake_reserve_running,
            is_update_active_running: status.is_update_active_running,
            is_update_deactivated_running: status.is_update_deactivated_running,
            is_any_process_running: status.is_any_process_running,
            current_operation: status.current_operation,
            last_execution_time: status.last_execution_time,
        }
    }
}

/// The ledger's position within the current epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcEpochProgress {
    /// The current epoch number.
    pub epoch: u64,

    /// The number of slots in the current epoch.
    pub slots_in_epoch: u64,

    /// The current slot's index within the epoch.
    pub slot_index: u64,

    /// Slots left before the epoch boundary.
    pub slots_remaining: u64,

    /// Approximate seconds left before the epoch boundary.
    pub seconds_remaining: u64,

    /// How far through the epoch the ledger is, in percent.
    pub progress_pct: f64,
}

impl From<EpochProgress> for RpcEpochProgress {
    fn from(progress: EpochProgress) -> Self {
        Self {
            epoch: progress.window.epoch,
            slots_in_epoch: progress.window.slots_in_epoch,
            slot_index: progress.window.slot_index,
            slots_remaining: progress.slots_remaining,
            seconds_remaining: progress.seconds_remaining,
            progress_pct: progress.progress_pct,
        }
    }
}

/// The countdown to a crank family's execution slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTargetSlot {
    /// The current absolute slot.
    pub current_slot: u64,

    /// The slot at which execution becomes due.
    pub target_slot: u64,

    /// Approximate signed seconds until the target slot; negative once the
    /// target has passed.
    pub time_until_execution_secs: i64,
}

impl From<TargetSlot> for RpcTargetSlot {
    fn from(target: TargetSlot) -> Self {
        Self {
            current_slot: target.current_slot,
            target_slot: target.target_slot,
            time_until_execution_secs: target.time_until_execution_secs,
        }
    }
}
