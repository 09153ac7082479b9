//! Ledger clock sources.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::epoch_schedule::EpochSchedule;
use tokio::sync::OnceCell;

use crate::{clock::EpochWindow, errors::ClockError};

/// The queries the epoch clock needs from the ledger.
#[async_trait]
pub trait LedgerSource {
    /// Returns the ledger's current epoch position.
    async fn epoch_info(&self) -> Result<EpochWindow, ClockError>;

    /// Returns the last slot of the given epoch.
    async fn last_slot_in_epoch(&self, epoch: u64) -> Result<u64, ClockError>;
}

/// A [`LedgerSource`] backed by a Solana RPC endpoint.
///
/// Every query is bounded by `request_timeout` so a hung endpoint cannot hold
/// the scheduler's run-guard indefinitely. The epoch schedule does not change
/// over the life of the chain, so it is fetched once and cached.
pub struct SolanaLedger {
    rpc: Arc<RpcClient>,
    request_timeout: Duration,
    schedule: OnceCell<EpochSchedule>,
}

impl fmt::Debug for SolanaLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolanaLedger")
            .field("url", &self.rpc.url())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl SolanaLedger {
    /// Creates a new ledger source over the given RPC client.
    pub fn new(rpc: Arc<RpcClient>, request_timeout: Duration) -> Self {
        Self {
            rpc,
            request_timeout,
            schedule: OnceCell::new(),
        }
    }

    async fn bounded<T, F>(&self, what: &str, query: F) -> Result<T, ClockError>
    where
        F: Future<Output = Result<T, solana_client::client_error::ClientError>>,
    {
        match tokio::time::timeout(self.request_timeout, query).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ClockError::LedgerUnavailable(format!("{what}: {e}"))),
            Err(_) => Err(ClockError::LedgerUnavailable(format!("{what}: timed out"))),
        }
    }
}

#[async_trait]
impl LedgerSource for SolanaLedger {
    async fn epoch_info(&self) -> Result<EpochWindow, ClockError> {
        let info = self
            .bounded("getEpochInfo", self.rpc.get_epoch_info())
            .await?;

        Ok(EpochWindow {
            epoch: info.epoch,
            slots_in_epoch: info.slots_in_epoch,
            absolute_slot: info.absolute_slot,
            slot_index: info.slot_index,
        })
    }

    async fn last_slot_in_epoch(&self, epoch: u64) -> Result<u64, ClockError> {
        let schedule = self
            .schedule
            .get_or_try_init(|| self.bounded("getEpochSchedule", self.rpc.get_epoch_schedule()))
            .await?;

        Ok(schedule.get_last_slot_in_epoch(epoch))
    }
}
