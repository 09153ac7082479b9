//! Bootstraps an RPC server for the crank node.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use crank_epoch::{ClockError, ClockReader, LedgerSource};
use crank_primitives::operations::CrankFamily;
use crank_rpc::{
    traits::{CrankControlApiServer, CrankMonitoringApiServer},
    types::{RpcCrankStatus, RpcEpochProgress, RpcTargetSlot},
};
use crank_scheduler::ExecutionState;
use jsonrpsee::{
    core::RpcResult,
    types::{ErrorCode, ErrorObjectOwned},
    RpcModule,
};
use tokio::{
    sync::{mpsc, oneshot},
    time::Instant,
};
use tracing::{debug, info, warn};

/// Starts the RPC server and serves until the stop signal fires.
pub(crate) async fn start_rpc<T>(
    rpc_impl: T,
    rpc_addr: String,
    stop_rx: oneshot::Receiver<()>,
) -> anyhow::Result<()>
where
    T: CrankControlApiServer + CrankMonitoringApiServer + Clone + Sync + Send,
{
    let mut rpc_module = RpcModule::new(rpc_impl.clone());

    let control_api = CrankControlApiServer::into_rpc(rpc_impl.clone());
    let monitoring_api = CrankMonitoringApiServer::into_rpc(rpc_impl);

    rpc_module.merge(control_api).context("merge control api")?;
    rpc_module
        .merge(monitoring_api)
        .context("merge monitoring api")?;

    info!("starting crank rpc server at {rpc_addr}");
    let rpc_server = jsonrpsee::server::ServerBuilder::new()
        .build(&rpc_addr)
        .await
        .context("build crank rpc server")?;

    let rpc_handle = rpc_server.start(rpc_module);
    debug!("crank rpc server started");

    let _ = stop_rx.await;
    info!("stopping rpc server");

    if rpc_handle.stop().is_err() {
        warn!("rpc server already stopped");
    }

    Ok(())
}

/// The RPC server's view of the node: the shared execution state, the epoch
/// clock, and the manual-trigger queue into the scheduler loop.
pub(crate) struct CrankRpc<C> {
    state: Arc<ExecutionState>,
    clock: ClockReader<C>,
    triggers: mpsc::Sender<CrankFamily>,
    started_at: Instant,
}

impl<C> Clone for CrankRpc<C> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            clock: self.clock.clone(),
            triggers: self.triggers.clone(),
            started_at: self.started_at,
        }
    }
}

impl<C> CrankRpc<C> {
    /// Creates a new RPC backend.
    pub(crate) fn new(
        state: Arc<ExecutionState>,
        clock: ClockReader<C>,
        triggers: mpsc::Sender<CrankFamily>,
    ) -> Self {
        Self {
            state,
            clock,
            triggers,
            started_at: Instant::now(),
        }
    }
}

fn clock_error(e: ClockError) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(ErrorCode::InternalError.code(), e.to_string(), None::<()>)
}

#[async_trait]
impl<C> CrankControlApiServer for CrankRpc<C>
where
    C: LedgerSource + Send + Sync + 'static,
{
    async fn get_uptime(&self) -> RpcResult<u64> {
        Ok(self.started_at.elapsed().as_secs())
    }
}

#[async_trait]
impl<C> CrankMonitoringApiServer for CrankRpc<C>
where
    C: LedgerSource + Send + Sync + 'static,
{
    async fn get_execution_status(&self) -> RpcResult<RpcCrankStatus> {
        Ok(self.state.snapshot().into())
    }

    async fn get_epoch_progress(&self) -> RpcResult<RpcEpochProgress> {
        self.clock
            .epoch_progress()
            .await
            .map(Into::into)
            .map_err(clock_error)
    }

    async fn get_target_slot(&self, lookback_slots: u64) -> RpcResult<RpcTargetSlot> {
        self.clock
            .check_target_slot(lookback_slots)
            .await
            .map(|(_, target)| target.into())
            .map_err(clock_error)
    }

    async fn trigger_crank(&self, family: CrankFamily) -> RpcResult<bool> {
        let queued = self.triggers.try_send(family).is_ok();

        if queued {
            info!(%family, "manual crank trigger queued");
        } else {
            warn!(%family, "manual trigger dropped, queue full or scheduler gone");
        }

        Ok(queued)
    }
}
