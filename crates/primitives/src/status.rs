//! Queryable snapshot of the scheduler's execution state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::operations::CrankOperation;

/// A point-in-time snapshot of which crank operations are running.
///
/// This is process-wide, in-memory state owned by the scheduler; it is reset
/// on restart and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrankExecutionStatus {
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

    /// When a crank family last completed successfully.
    pub last_execution_time: Option<DateTime<Utc>>,
}
