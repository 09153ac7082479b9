//! The scheduler's shared execution state.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use crank_primitives::{operations::CrankOperation, status::CrankExecutionStatus};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct StatusInner {
    deactivate_stake_running: bool,
    stake_reserve_running: bool,
    update_active_running: bool,
    update_deactivated_running: bool,
    current_operation: Option<CrankOperation>,
    last_execution_time: Option<chrono::DateTime<Utc>>,
}

impl StatusInner {
    fn clear_running(&mut self) {
        self.deactivate_stake_running = false;
        self.stake_reserve_running = false;
        self.update_active_running = false;
        self.update_deactivated_running = false;
        self.current_operation = None;
    }
}

/// The global run-guard and per-operation running flags, in one owned object.
///
/// The guard is a compare-and-swap so two concurrent due-checks can never both
/// observe it free. It is held for the full duration of a family's work,
/// including a multi-step sequence, and released on every exit path. Only the
/// scheduler mutates this state; everything else reads snapshots.
#[derive(Debug, Default)]
pub struct ExecutionState {
    guard: AtomicBool,
    inner: Mutex<StatusInner>,
}

impl ExecutionState {
    /// Creates a fresh, all-idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to take the global run-guard.
    ///
    /// Returns `false` if another family already holds it.
    pub fn try_acquire(&self) -> bool {
        self.guard
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Marks the given operation as the one currently in flight.
    ///
    /// Must only be called while holding the guard. A multi-step family calls
    /// this once per step; the previous step's flag is cleared.
    pub fn begin_operation(&self, operation: CrankOperation) {
        let mut inner = self.inner.lock();
        inner.clear_running();

        match operation {
            CrankOperation::DeactivateStake => inner.deactivate_stake_running = true,
            CrankOperation::StakeReserve => inner.stake_reserve_running = true,
            CrankOperation::UpdateActive => inner.update_active_running = true,
            CrankOperation::UpdateDeactivated => inner.update_deactivated_running = true,
            // manual tooling operations carry no running flag of their own
            CrankOperation::MergeStakes | CrankOperation::Redelegate => {}
        }

        inner.current_operation = Some(operation);
    }

    /// Releases the guard after a family's run, success or failure.
    ///
    /// All running flags are force-reset and the current operation cleared
    /// before the guard is dropped, so no observer can see a free guard with
    /// stale flags.
    pub fn release(&self) {
        {
            let mut inner = self.inner.lock();
            inner.clear_running();
            inner.last_execution_time = Some(Utc::now());
        }

        self.guard.store(false, Ordering::Release);
    }

    /// Whether any family currently holds the guard.
    pub fn is_running(&self) -> bool {
        self.guard.load(Ordering::Acquire)
    }

    /// Takes a point-in-time snapshot for status queries.
    pub fn snapshot(&self) -> CrankExecutionStatus {
        let inner = self.inner.lock();

        CrankExecutionStatus {
            is_deactivate_stake_running: inner.deactivate_stake_running,
            is_stake_reserve_running: inner.stake_reserve_running,
            is_update_active_running: inner.update_active_running,
            is_update_deactivated_running: inner.update_deactivated_running,
            is_any_process_running: self.guard.load(Ordering::Acquire),
            current_operation: inner.current_operation,
            last_execution_time: inner.last_execution_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn guard_admits_exactly_one_holder() {
        let state = ExecutionState::new();

        assert!(state.try_acquire());
        assert!(!state.try_acquire());

        state.release();
        assert!(state.try_acquire());
    }

    #[test]
    fn concurrent_acquirers_are_serialized() {
        let state = Arc::new(ExecutionState::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || state.try_acquire())
            })
            .collect();

        let acquired = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&acquired| acquired)
            .count();
        assert_eq!(acquired, 1);
    }

    #[test]
    fn release_resets_flags_before_freeing_the_guard() {
        let state = ExecutionState::new();

        assert!(state.try_acquire());
        state.begin_operation(CrankOperation::UpdateActive);

        let snapshot = state.snapshot();
        assert!(snapshot.is_update_active_running);
        assert!(snapshot.is_any_process_running);
        assert_eq!(
            snapshot.current_operation,
            Some(CrankOperation::UpdateActive)
        );

        state.release();

        let snapshot = state.snapshot();
        assert!(!snapshot.is_any_process_running);
        assert!(!snapshot.is_update_active_running);
        assert_eq!(snapshot.current_operation, None);
        assert!(snapshot.last_execution_time.is_some());
    }

    #[test]
    fn multi_step_family_swaps_the_running_flag() {
        let state = ExecutionState::new();

        assert!(state.try_acquire());
        state.begin_operation(CrankOperation::UpdateActive);
        state.begin_operation(CrankOperation::UpdateDeactivated);

        let snapshot = state.snapshot();
        assert!(!snapshot.is_update_active_running);
        assert!(snapshot.is_update_deactivated_running);
        assert_eq!(
            snapshot.current_operation,
            Some(CrankOperation::UpdateDeactivated)
        );

        state.release();
    }
}
