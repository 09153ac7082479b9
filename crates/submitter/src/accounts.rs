//! The protocol's fixed account registry, resolved once at startup.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::errors::SubmitError;

/// The raw, stringly-typed account registry as it appears in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolAccountsConfig {
    /// The staking program id.
    pub program_id: String,

    /// The program's state account.
    pub state: String,

    /// The on-chain validator list account.
    pub validator_list: String,

    /// The on-chain stake list account.
    pub stake_list: String,

    /// The reserve PDA holding undelegated lamports.
    pub reserve_pda: String,

    /// The PDA with deposit authority over pool stake accounts.
    pub stake_deposit_authority: String,

    /// The PDA with withdraw authority over pool stake accounts.
    pub stake_withdraw_authority: String,

    /// The liquid-staking token mint.
    pub pool_mint: String,

    /// The PDA with mint authority over the pool mint.
    pub pool_mint_authority: String,

    /// The treasury's pool-token account.
    pub treasury_pool_account: String,

    /// The operational SOL account that collects sweep remainders.
    pub operational_sol_account: String,
}

/// The resolved registry of fixed protocol addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolAccounts {
    /// The staking program id.
    pub program_id: Pubkey,

    /// The program's state account.
    pub state: Pubkey,

    /// The on-chain validator list account.
    pub validator_list: Pubkey,

    /// The on-chain stake list account.
    pub stake_list: Pubkey,

    /// The reserve PDA holding undelegated lamports.
    pub reserve_pda: Pubkey,

    /// The PDA with deposit authority over pool stake accounts.
    pub stake_deposit_authority: Pubkey,

    /// The PDA with withdraw authority over pool stake accounts.
    pub stake_withdraw_authority: Pubkey,

    /// The liquid-staking token mint.
    pub pool_mint: Pubkey,

    /// The PDA with mint authority over the pool mint.
    pub pool_mint_authority: Pubkey,

    /// The treasury's pool-token account.
    pub treasury_pool_account: Pubkey,

    /// The operational SOL account that collects sweep remainders.
    pub operational_sol_account: Pubkey,
}

fn parse_pubkey(name: &'static str, raw: &str) -> Result<Pubkey, SubmitError> {
    Pubkey::from_str(raw).map_err(|e| SubmitError::InvalidAddress {
        name,
        reason: e.to_string(),
    })
}

impl ProtocolAccounts {
    /// Resolves the registry from its config representation.
    pub fn from_config(config: &ProtocolAccountsConfig) -> Result<Self, SubmitError> {
        Ok(Self {
            program_id: parse_pubkey("program_id", &config.program_id)?,
            state: parse_pubkey("state", &config.state)?,
            validator_list: parse_pubkey("validator_list", &config.validator_list)?,
            stake_list: parse_pubkey("stake_list", &config.stake_list)?,
            reserve_pda: parse_pubkey("reserve_pda", &config.reserve_pda)?,
            stake_deposit_authority: parse_pubkey(
                "stake_deposit_authority",
                &config.stake_deposit_authority,
            )?,
            stake_withdraw_authority: parse_pubkey(
                "stake_withdraw_authority",
                &config.stake_withdraw_authority,
            )?,
            pool_mint: parse_pubkey("pool_mint", &config.pool_mint)?,
            pool_mint_authority: parse_pubkey("pool_mint_authority", &config.pool_mint_authority)?,
            treasury_pool_account: parse_pubkey(
                "treasury_pool_account",
                &config.treasury_pool_account,
            )?,
            operational_sol_account: parse_pubkey(
                "operational_sol_account",
                &config.operational_sol_account,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use solana_sdk::pubkey::Pubkey;

    use super::*;

    fn config() -> ProtocolAccountsConfig {
        ProtocolAccountsConfig {
            program_id: Pubkey::new_unique().to_string(),
            state: Pubkey::new_unique().to_string(),
            validator_list: Pubkey::new_unique().to_string(),
            stake_list: Pubkey::new_unique().to_string(),
            reserve_pda: Pubkey::new_unique().to_string(),
            stake_deposit_authority: Pubkey::new_unique().to_string(),
            stake_withdraw_authority: Pubkey::new_unique().to_string(),
            pool_mint: Pubkey::new_unique().to_string(),
            pool_mint_authority: Pubkey::new_unique().to_string(),
            treasury_pool_account: Pubkey::new_unique().to_string(),
            operational_sol_account: Pubkey::new_unique().to_string(),
        }
    }

    #[test]
    fn resolves_valid_config() {
        let config = config();
        let accounts = ProtocolAccounts::from_config(&config).unwrap();
        assert_eq!(accounts.program_id.to_string(), config.program_id);
    }

    #[test]
    fn rejects_bad_address_with_field_name() {
        let mut config = config();
        config.reserve_pda = "not-a-pubkey".to_string();

        let err = ProtocolAccounts::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            SubmitError::InvalidAddress {
                name: "reserve_pda",
                ..
            }
        ));
    }
}
