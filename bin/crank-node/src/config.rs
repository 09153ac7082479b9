use std::{path::PathBuf, time::Duration};

use crank_db::persistent::config::DbConfig;
use crank_submitter::ProtocolAccountsConfig;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_INTER_PAGE_DELAY, DEFAULT_PAGE_SIZE, DEFAULT_TICK_INTERVAL};

/// The configuration values that dictate the behavior of the crank node.
///
/// None of these are consensus-critical; the on-chain program rejects
/// maintenance transactions it does not need, so differences between operator
/// setups cost fees at worst.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Config {
    /// The RPC server addr for the crank node.
    pub rpc_addr: String,

    /// The SQLite database file holding the delegation records.
    pub db_file: PathBuf,

    /// The number of tokio worker threads.
    pub num_threads: Option<u8>,

    /// The stack size per worker thread, in bytes.
    pub thread_stack_size: Option<usize>,

    /// The configuration required to talk to the ledger.
    pub ledger: LedgerConfig,

    /// The configuration for the sqlite3 database.
    pub db: DbConfig,

    /// The protocol's fixed account registry.
    pub accounts: ProtocolAccountsConfig,

    /// The scheduler tunables.
    pub crank: CrankConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LedgerConfig {
    /// The URL of the ledger RPC endpoint.
    pub url: String,

    /// The path to the cranker's fee-payer keypair file.
    pub cranker_keypair: PathBuf,

    /// The timeout applied to every ledger request.
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CrankConfig {
    /// Lookback window for the deactivate family, in slots before the epoch
    /// boundary.
    pub lookback_slots_deactivate: u64,

    /// Lookback window for the stake-delta family.
    pub lookback_slots_stake_delta: u64,

    /// Lookback window for the update family.
    pub lookback_slots_update: u64,

    /// Delegation records fetched per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// The validator vote accounts the stake-delta family reserves for, in
    /// on-chain validator-list order.
    pub validators: Vec<String>,

    /// How often the scheduler's due-checks run.
    #[serde(default = "default_tick_interval")]
    pub tick_interval: Duration,

    /// Pause between delegation pages.
    #[serde(default = "default_inter_page_delay")]
    pub inter_page_delay: Duration,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_tick_interval() -> Duration {
    DEFAULT_TICK_INTERVAL
}

fn default_inter_page_delay() -> Duration {
    DEFAULT_INTER_PAGE_DELAY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_toml() {
        let config = r#"
            rpc_addr = "localhost:5678"
            db_file = ".data/delegations.db"
            num_threads = 2

            [ledger]
            url = "http://localhost:8899"
            cranker_keypair = "cranker.json"
            request_timeout = { secs = 10, nanos = 0 }

            [db]
            max_retry_count = 3
            backoff_period = { secs = 0, nanos = 200000000 }

            [accounts]
            program_id = "Stake11111111111111111111111111111111111111"
            state = "Stake11111111111111111111111111111111111111"
            validator_list = "Stake11111111111111111111111111111111111111"
            stake_list = "Stake11111111111111111111111111111111111111"
            reserve_pda = "Stake11111111111111111111111111111111111111"
            stake_deposit_authority = "Stake11111111111111111111111111111111111111"
            stake_withdraw_authority = "Stake11111111111111111111111111111111111111"
            pool_mint = "Stake11111111111111111111111111111111111111"
            pool_mint_authority = "Stake11111111111111111111111111111111111111"
            treasury_pool_account = "Stake11111111111111111111111111111111111111"
            operational_sol_account = "Stake11111111111111111111111111111111111111"

            [crank]
            lookback_slots_deactivate = 3000
            lookback_slots_stake_delta = 3000
            lookback_slots_update = 1500
            page_size = 10
            validators = ["Vote111111111111111111111111111111111111111"]
            tick_interval = { secs = 10, nanos = 0 }
            inter_page_delay = { secs = 1, nanos = 0 }
        "#;

        let config = toml::from_str::<Config>(config);
        assert!(
            config.is_ok(),
            "must be able to deserialize config from toml but got: {}",
            config.unwrap_err()
        );

        let config = config.unwrap();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized = toml::from_str::<Config>(&serialized).unwrap();
        assert_eq!(
            deserialized, config,
            "must be able to serialize and deserialize config to toml"
        );
    }

    #[test]
    fn test_crank_section_defaults() {
        let crank = r#"
            lookback_slots_deactivate = 3000
            lookback_slots_stake_delta = 3000
            lookback_slots_update = 1500
            validators = []
        "#;

        let crank = toml::from_str::<CrankConfig>(crank).unwrap();
        assert_eq!(crank.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(crank.tick_interval, DEFAULT_TICK_INTERVAL);
        assert_eq!(crank.inter_page_delay, DEFAULT_INTER_PAGE_DELAY);
    }
}
