//! Epoch progress and target-slot computation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{errors::ClockError, ledger::LedgerSource};

/// The ledger's average slot time in milliseconds.
pub const SLOT_TIME_MS: i64 = 400;

/// The ledger's position within the current epoch.
///
/// Derived on demand from the ledger, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochWindow {
    /// The current epoch number.
    pub epoch: u64,

    /// The number of slots in the current epoch.
    pub slots_in_epoch: u64,

    /// The current slot, counted from genesis.
    pub absolute_slot: u64,

    /// The current slot's index within the epoch.
    pub slot_index: u64,
}

impl EpochWindow {
    /// Rejects structurally invalid epoch data from the ledger.
    pub(crate) fn validate(&self) -> Result<(), ClockError> {
        if self.slots_in_epoch == 0 {
            return Err(ClockError::InvalidEpochInfo(
                "slots_in_epoch is zero".to_string(),
            ));
        }

        if self.slot_index >= self.slots_in_epoch {
            return Err(ClockError::InvalidEpochInfo(format!(
                "slot index {} not within epoch of {} slots",
                self.slot_index, self.slots_in_epoch
            )));
        }

        Ok(())
    }

    /// The number of slots left before the epoch boundary.
    pub fn slots_remaining(&self) -> u64 {
        self.slots_in_epoch - self.slot_index
    }
}

/// Epoch progress report derived from an [`EpochWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochProgress {
    /// The validated window this report was derived from.
    pub window: EpochWindow,

    /// Slots left before the epoch boundary.
    pub slots_remaining: u64,

    /// Approximate seconds left before the epoch boundary.
    pub seconds_remaining: u64,

    /// How far through the epoch the ledger is, in percent.
    pub progress_pct: f64,
}

impl From<EpochWindow> for EpochProgress {
    fn from(window: EpochWindow) -> Self {
        let slots_remaining = window.slots_remaining();
        let seconds_remaining = slots_remaining.saturating_mul(SLOT_TIME_MS as u64) / 1000;
        let progress_pct = (window.slot_index as f64 / window.slots_in_epoch as f64) * 100.0;

        Self {
            window,
            slots_remaining,
            seconds_remaining,
            progress_pct,
        }
    }
}

/// The countdown to a crank family's execution slot.
///
/// `time_until_execution_secs` goes negative once the target has passed; the
/// scheduler treats `current_slot >= target_slot` as due regardless of sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSlot {
    /// The current absolute slot.
    pub current_slot: u64,

    /// The slot at which execution becomes due: the last slot of the current
    /// epoch minus the lookback window.
    pub target_slot: u64,

    /// Approximate signed seconds until the target slot.
    pub time_until_execution_secs: i64,
}

/// Computes epoch progress and target-slot countdowns from a [`LedgerSource`].
///
/// No retries at this layer; callers decide what a failed read means.
#[derive(Debug)]
pub struct ClockReader<C> {
    source: Arc<C>,
}

impl<C> Clone for ClockReader<C> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<C: LedgerSource> ClockReader<C> {
    /// Creates a new reader over the given ledger source.
    pub fn new(source: Arc<C>) -> Self {
        Self { source }
    }

    /// Reads and validates the ledger's current epoch position.
    pub async fn epoch_progress(&self) -> Result<EpochProgress, ClockError> {
        let window = self.source.epoch_info().await?;
        window.validate()?;

        Ok(EpochProgress::from(window))
    }

    /// Computes the target-slot countdown for the given lookback window.
    pub async fn check_target_slot(
        &self,
        lookback_slots: u64,
    ) -> Result<(EpochWindow, TargetSlot), ClockError> {
        let progress = self.epoch_progress().await?;
        let window = progress.window;

        let last_slot = self.source.last_slot_in_epoch(window.epoch).await?;
        let target_slot = last_slot.saturating_sub(lookback_slots);
        let slots_until = target_slot as i64 - window.absolute_slot as i64;
        let time_until_execution_secs = slots_until * SLOT_TIME_MS / 1000;

        debug!(
            current_slot = window.absolute_slot,
            target_slot, time_until_execution_secs, "slot check"
        );

        Ok((
            window,
            TargetSlot {
                current_slot: window.absolute_slot,
                target_slot,
                time_until_execution_secs,
            },
        ))
    }
}
