//! The epoch-driven orchestrator.

use std::{sync::Arc, time::Duration};

use crank_db::DelegationStore;
use crank_epoch::{ClockReader, LedgerSource};
use crank_primitives::operations::{CrankFamily, CrankOperation};
use crank_submitter::{CrankTarget, TxSubmitter};
use solana_sdk::pubkey::Pubkey;
use tokio::{
    sync::{mpsc, oneshot},
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{batch::BatchExecutor, errors::BatchError, status::ExecutionState};

/// Tunables for the scheduler loop.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often the due-checks run.
    pub tick_interval: Duration,

    /// Lookback window for the deactivate family, in slots before the epoch
    /// boundary.
    pub lookback_slots_deactivate: u64,

    /// Lookback window for the stake-delta family.
    pub lookback_slots_stake_delta: u64,

    /// Lookback window for the update family.
    pub lookback_slots_update: u64,

    /// The validator vote accounts the stake-delta family reserves for, in
    /// on-chain validator-list order.
    pub validators: Vec<Pubkey>,
}

/// The highest epoch each family has completed in, advanced only on success.
#[derive(Debug, Default)]
struct EpochLedger {
    deactivate: u64,
    stake_delta: u64,
    update_cranks: u64,
}

impl EpochLedger {
    fn get(&self, family: CrankFamily) -> u64 {
        match family {
            CrankFamily::Deactivate => self.deactivate,
            CrankFamily::StakeDelta => self.stake_delta,
            CrankFamily::UpdateCranks => self.update_cranks,
        }
    }

    fn set(&mut self, family: CrankFamily, epoch: u64) {
        match family {
            CrankFamily::Deactivate => self.deactivate = epoch,
            CrankFamily::StakeDelta => self.stake_delta = epoch,
            CrankFamily::UpdateCranks => self.update_cranks = epoch,
        }
    }
}

/// Polls the epoch clock on a fixed timer and runs each crank family at most
/// once per epoch, never more than one family at a time.
///
/// A family runs when the current slot has reached its target slot, the
/// global run-guard is free, and the family has not yet completed in the
/// current epoch. The guard is held across the family's entire run, so a
/// long batch simply spans as many ticks as it needs.
#[derive(Debug)]
pub struct CrankScheduler<C, S, T> {
    clock: ClockReader<C>,
    batches: BatchExecutor<S, T>,
    submitter: Arc<T>,
    state: Arc<ExecutionState>,
    config: SchedulerConfig,
    last_executed: EpochLedger,
}

impl<C, S, T> CrankScheduler<C, S, T>
where
    C: LedgerSource + Send + Sync,
    S: DelegationStore + Send + Sync,
    T: TxSubmitter + Send + Sync,
{
    /// Creates a new scheduler.
    ///
    /// `last_executed_epoch` starts at zero for every family; after a restart
    /// the first eligible tick re-runs each family once, which the on-chain
    /// program tolerates.
    pub fn new(
        clock: ClockReader<C>,
        batches: BatchExecutor<S, T>,
        submitter: Arc<T>,
        state: Arc<ExecutionState>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            clock,
            batches,
            submitter,
            state,
            config,
            last_executed: EpochLedger::default(),
        }
    }

    /// The shared execution state, for status queries.
    pub fn state(&self) -> Arc<ExecutionState> {
        self.state.clone()
    }

    /// Runs the scheduler until the shutdown signal fires.
    ///
    /// `triggers` carries manual family invocations from operator tooling;
    /// they bypass the target-slot check but remain subject to the guard and
    /// the once-per-epoch rule. In-flight work is abandoned on shutdown, not
    /// cancelled.
    pub async fn run(
        mut self,
        mut triggers: mpsc::Receiver<CrankFamily>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            tick_interval = ?self.config.tick_interval,
            validators = self.config.validators.len(),
            "crank scheduler started"
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("crank scheduler shutting down");
                    break;
                }

                Some(family) = triggers.recv() => {
                    info!(%family, "manual trigger received");
                    self.trigger(family).await;
                }

                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// Evaluates every family's due-check once, in order.
    async fn tick(&mut self) {
        for family in [
            CrankFamily::Deactivate,
            CrankFamily::StakeDelta,
            CrankFamily::UpdateCranks,
        ] {
            let lookback = self.lookback_slots(family);
            let (window, target) = match self.clock.check_target_slot(lookback).await {
                Ok(checked) => checked,
                Err(e) => {
                    // guard untouched; the family stays due for a later tick
                    warn!(%family, %e, "clock read failed, skipping family this tick");
                    continue;
                }
            };

            if target.current_slot < target.target_slot {
                debug!(
                    %family,
                    time_until_execution_secs = target.time_until_execution_secs,
                    "family not yet due"
                );
                continue;
            }

            if !self.run_family(family, window.epoch).await {
                // a held guard short-circuits the remaining checks; they are
                // re-evaluated on a later tick
                break;
            }
        }
    }

    /// Runs one family immediately, subject to the guard and the
    /// once-per-epoch rule but not to the target-slot check.
    pub async fn trigger(&mut self, family: CrankFamily) {
        let epoch = match self.clock.epoch_progress().await {
            Ok(progress) => progress.window.epoch,
            Err(e) => {
                warn!(%family, %e, "clock read failed, manual trigger dropped");
                return;
            }
        };

        self.run_family(family, epoch).await;
    }

    /// Runs `family` if it is eligible in `epoch` and the guard is free.
    ///
    /// Returns `false` only when the guard was held by someone else.
    async fn run_family(&mut self, family: CrankFamily, epoch: u64) -> bool {
        if epoch <= self.last_executed.get(family) {
            debug!(%family, epoch, "family already completed this epoch");
            return true;
        }

        if !self.state.try_acquire() {
            debug!(%family, "run-guard held, not starting");
            return false;
        }

        info!(%family, epoch, "crank family starting");

        match self.execute(family).await {
            Ok(()) => {
                self.last_executed.set(family, epoch);
                info!(%family, epoch, "crank family completed");
            }
            Err(e) => {
                // last_executed is not advanced; the family stays eligible
                // and retries on a later tick within the same epoch
                warn!(%family, epoch, %e, "crank family failed");
            }
        }

        self.state.release();

        true
    }

    /// The family's work, run while holding the guard.
    async fn execute(&self, family: CrankFamily) -> Result<(), BatchError> {
        match family {
            CrankFamily::Deactivate => {
                self.state.begin_operation(CrankOperation::DeactivateStake);
                self.batches.run(CrankOperation::DeactivateStake).await?;
            }
            CrankFamily::StakeDelta => {
                self.state.begin_operation(CrankOperation::StakeReserve);
                self.reserve_for_validators().await;
            }
            CrankFamily::UpdateCranks => {
                // strict sequence: active fully, then deactivated fully
                self.state.begin_operation(CrankOperation::UpdateActive);
                self.batches.run(CrankOperation::UpdateActive).await?;

                self.state
                    .begin_operation(CrankOperation::UpdateDeactivated);
                self.batches.run(CrankOperation::UpdateDeactivated).await?;
            }
        }

        Ok(())
    }

    /// One `stake_reserve` per configured validator, sequentially, continuing
    /// past per-validator failures.
    async fn reserve_for_validators(&self) {
        for (index, vote) in self.config.validators.iter().enumerate() {
            let target = CrankTarget::Reserve {
                validator_index: index as u32,
                validator_vote: *vote,
            };

            match self
                .submitter
                .submit(CrankOperation::StakeReserve, &target)
                .await
            {
                Ok(signature) => debug!(%vote, %signature, "stake reserved"),
                Err(e) => warn!(%vote, %e, "stake reserve failed for validator"),
            }
        }
    }

    fn lookback_slots(&self, family: CrankFamily) -> u64 {
        match family {
            CrankFamily::Deactivate => self.config.lookback_slots_deactivate,
            CrankFamily::StakeDelta => self.config.lookback_slots_stake_delta,
            CrankFamily::UpdateCranks => self.config.lookback_slots_update,
        }
    }
}
