//! The crank node is the off-chain operator that drives the periodic epoch
//! maintenance of a liquid-staking protocol.

use std::{fs, path::Path, str::FromStr, sync::Arc};

use anyhow::Context;
use clap::Parser;
use config::Config;
use constants::{DEFAULT_THREAD_COUNT, DEFAULT_THREAD_STACK_SIZE, TRIGGER_QUEUE_DEPTH};
use crank_common::logging::{self, LoggerConfig};
use crank_db::persistent::SqliteDelegationStore;
use crank_epoch::{ClockReader, SolanaLedger};
use crank_scheduler::{BatchExecutor, CrankScheduler, ExecutionState, SchedulerConfig};
use crank_submitter::{ProtocolAccounts, SolanaSubmitter};
use rpc_server::CrankRpc;
use serde::de::DeserializeOwned;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{pubkey::Pubkey, signature::read_keypair_file};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::{
    runtime,
    sync::{mpsc, oneshot},
};
use tracing::{debug, info, trace};

mod args;
mod config;
mod constants;
mod rpc_server;

fn main() {
    logging::init(LoggerConfig::with_base_name("crank-node"));

    let cli = args::Cli::parse();
    let config = parse_toml::<Config>(cli.config);

    let runtime = runtime::Builder::new_multi_thread()
        .worker_threads(config.num_threads.unwrap_or(DEFAULT_THREAD_COUNT).into())
        .thread_stack_size(
            config
                .thread_stack_size
                .unwrap_or(DEFAULT_THREAD_STACK_SIZE),
        )
        .enable_all()
        .build()
        .expect("must be able to create runtime");

    if let Err(e) = runtime.block_on(bootstrap(config)) {
        panic!("crank node crashed: {e:?}");
    }

    info!("crank node shutdown complete");
}

/// Wires the node together and runs it until a shutdown signal arrives.
async fn bootstrap(config: Config) -> anyhow::Result<()> {
    let rpc_client = Arc::new(RpcClient::new(config.ledger.url.clone()));
    let ledger = Arc::new(SolanaLedger::new(
        rpc_client.clone(),
        config.ledger.request_timeout,
    ));
    let clock = ClockReader::new(ledger);

    let cranker = read_keypair_file(&config.ledger.cranker_keypair)
        .map_err(|e| anyhow::anyhow!("failed to read cranker keypair: {e}"))?;
    let accounts =
        ProtocolAccounts::from_config(&config.accounts).context("resolve protocol accounts")?;
    let submitter = Arc::new(SolanaSubmitter::new(
        rpc_client,
        cranker,
        accounts,
        config.ledger.request_timeout,
    ));
    info!(cranker = %submitter.cranker_pubkey(), "transaction submitter ready");

    let pool = SqlitePoolOptions::new()
        .connect_with(
            SqliteConnectOptions::new()
                .filename(&config.db_file)
                .create_if_missing(true),
        )
        .await
        .context("open sqlite database")?;
    let store = SqliteDelegationStore::new(pool, config.db.clone());
    store.migrate().await.context("migrate sqlite database")?;

    let validators = config
        .crank
        .validators
        .iter()
        .map(|raw| Pubkey::from_str(raw))
        .collect::<Result<Vec<_>, _>>()
        .context("parse validator vote accounts")?;

    let state = Arc::new(ExecutionState::new());
    let batches = BatchExecutor::new(
        Arc::new(store),
        submitter.clone(),
        config.crank.page_size,
        config.crank.inter_page_delay,
    );
    let scheduler = CrankScheduler::new(
        clock.clone(),
        batches,
        submitter,
        state.clone(),
        SchedulerConfig {
            tick_interval: config.crank.tick_interval,
            lookback_slots_deactivate: config.crank.lookback_slots_deactivate,
            lookback_slots_stake_delta: config.crank.lookback_slots_stake_delta,
            lookback_slots_update: config.crank.lookback_slots_update,
            validators,
        },
    );

    let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_QUEUE_DEPTH);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let scheduler_task = tokio::spawn(scheduler.run(trigger_rx, shutdown_rx));

    let rpc_impl = CrankRpc::new(state, clock, trigger_tx);
    let (stop_rpc_tx, stop_rpc_rx) = oneshot::channel();
    let rpc_addr = config.rpc_addr.clone();
    let rpc_task = tokio::spawn(rpc_server::start_rpc(rpc_impl, rpc_addr, stop_rpc_rx));

    tokio::signal::ctrl_c()
        .await
        .context("listen for shutdown signal")?;
    info!("shutdown signal received");

    // in-flight crank work is abandoned, not cancelled
    let _ = shutdown_tx.send(());
    let _ = stop_rpc_tx.send(());

    scheduler_task.await.context("join scheduler")?;
    rpc_task.await.context("join rpc server")??;

    Ok(())
}

/// Reads and parses a TOML file from the given path into the given type `T`.
///
/// # Panics
///
/// 1. If the file is not readable.
/// 2. If the contents of the file cannot be deserialized into the given type `T`.
fn parse_toml<T>(path: impl AsRef<Path>) -> T
where
    T: std::fmt::Debug + DeserializeOwned,
{
    fs::read_to_string(path)
        .map(|p| {
            trace!(?p, "read file");

            let parsed = toml::from_str::<T>(&p).unwrap_or_else(|e| {
                panic!("failed to parse TOML file: {e:?}");
            });
            debug!(?parsed, "parsed TOML file");

            parsed
        })
        .unwrap_or_else(|_| {
            panic!("failed to read TOML file");
        })
}
