//! Instruction builders for the staking program's crank operations.
//!
//! The program is Anchor-based: instruction data is an 8-byte discriminator
//! derived from the instruction name followed by borsh-encoded arguments.

use borsh::BorshSerialize;
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    stake, sysvar,
};

use crate::accounts::ProtocolAccounts;

fn discriminator(name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("global:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);

    out
}

fn instruction_data<A: BorshSerialize>(name: &str, args: &A) -> Vec<u8> {
    let mut data = discriminator(name).to_vec();
    data.extend(borsh::to_vec(args).expect("borsh encoding of plain args must not fail"));

    data
}

#[derive(BorshSerialize)]
struct StakeReserveArgs {
    validator_index: u32,
}

#[derive(BorshSerialize)]
struct UpdateActiveArgs {
    stake_index: u32,
    validator_index: u32,
}

#[derive(BorshSerialize)]
struct UpdateDeactivatedArgs {
    stake_index: u32,
}

#[derive(BorshSerialize)]
struct DeactivateStakeArgs {
    stake_index: u32,
    validator_index: u32,
}

#[derive(BorshSerialize)]
struct MergeStakesArgs {
    destination_stake_index: u32,
    source_stake_index: u32,
    validator_index: u32,
}

#[derive(BorshSerialize)]
struct RedelegateArgs {
    stake_index: u32,
    source_validator_index: u32,
    destination_validator_index: u32,
}

/// Delegates lamports from the reserve into a fresh stake account for the
/// given validator. The fresh stake account must co-sign.
pub fn stake_reserve(
    accounts: &ProtocolAccounts,
    validator_vote: Pubkey,
    stake_account: Pubkey,
    rent_payer: Pubkey,
    validator_index: u32,
) -> Instruction {
    Instruction {
        program_id: accounts.program_id,
        accounts: vec![
            AccountMeta::new(accounts.state, false),
            AccountMeta::new(accounts.validator_list, false),
            AccountMeta::new(accounts.stake_list, false),
            AccountMeta::new_readonly(validator_vote, false),
            AccountMeta::new(accounts.reserve_pda, false),
            AccountMeta::new(stake_account, true),
            AccountMeta::new_readonly(accounts.stake_deposit_authority, false),
            AccountMeta::new(rent_payer, true),
            AccountMeta::new_readonly(sysvar::epoch_schedule::id(), false),
            AccountMeta::new_readonly(sysvar::stake_history::id(), false),
            #[allow(deprecated)]
            AccountMeta::new_readonly(stake::config::id(), false),
            AccountMeta::new_readonly(stake::program::id(), false),
        ],
        data: instruction_data("stake_reserve", &StakeReserveArgs { validator_index }),
    }
}

/// Refreshes the pool's accounting for an active stake account.
pub fn update_active(
    accounts: &ProtocolAccounts,
    stake_account: Pubkey,
    stake_index: u32,
    validator_index: u32,
) -> Instruction {
    Instruction {
        program_id: accounts.program_id,
        accounts: vec![
            AccountMeta::new(accounts.state, false),
            AccountMeta::new(accounts.stake_list, false),
            AccountMeta::new(accounts.validator_list, false),
            AccountMeta::new(stake_account, false),
            AccountMeta::new_readonly(accounts.stake_withdraw_authority, false),
            AccountMeta::new(accounts.reserve_pda, false),
            AccountMeta::new(accounts.pool_mint, false),
            AccountMeta::new_readonly(accounts.pool_mint_authority, false),
            AccountMeta::new(accounts.treasury_pool_account, false),
            AccountMeta::new_readonly(sysvar::stake_history::id(), false),
            AccountMeta::new_readonly(stake::program::id(), false),
        ],
        data: instruction_data(
            "update_active",
            &UpdateActiveArgs {
                stake_index,
                validator_index,
            },
        ),
    }
}

/// Sweeps a fully deactivated stake account back into the reserve.
pub fn update_deactivated(
    accounts: &ProtocolAccounts,
    stake_account: Pubkey,
    stake_index: u32,
) -> Instruction {
    Instruction {
        program_id: accounts.program_id,
        accounts: vec![
            AccountMeta::new(accounts.state, false),
            AccountMeta::new(accounts.stake_list, false),
            AccountMeta::new(stake_account, false),
            AccountMeta::new_readonly(accounts.stake_withdraw_authority, false),
            AccountMeta::new(accounts.reserve_pda, false),
            AccountMeta::new(accounts.pool_mint, false),
            AccountMeta::new_readonly(accounts.pool_mint_authority, false),
            AccountMeta::new(accounts.treasury_pool_account, false),
            AccountMeta::new_readonly(sysvar::stake_history::id(), false),
            AccountMeta::new_readonly(stake::program::id(), false),
            AccountMeta::new(accounts.operational_sol_account, false),
        ],
        data: instruction_data("update_deactivated", &UpdateDeactivatedArgs { stake_index }),
    }
}

/// Splits the over-delegated portion of a stake account into a fresh account
/// and deactivates it. The fresh split account must co-sign.
pub fn deactivate_stake(
    accounts: &ProtocolAccounts,
    stake_account: Pubkey,
    split_stake_account: Pubkey,
    split_rent_payer: Pubkey,
    stake_index: u32,
    validator_index: u32,
) -> Instruction {
    Instruction {
        program_id: accounts.program_id,
        accounts: vec![
            AccountMeta::new(accounts.state, false),
            AccountMeta::new(accounts.reserve_pda, false),
            AccountMeta::new(accounts.validator_list, false),
            AccountMeta::new(accounts.stake_list, false),
            AccountMeta::new(stake_account, false),
            AccountMeta::new_readonly(accounts.stake_deposit_authority, false),
            AccountMeta::new(split_stake_account, true),
            AccountMeta::new(split_rent_payer, true),
            AccountMeta::new_readonly(sysvar::epoch_schedule::id(), false),
            AccountMeta::new_readonly(sysvar::stake_history::id(), false),
            AccountMeta::new_readonly(stake::program::id(), false),
        ],
        data: instruction_data(
            "deactivate_stake",
            &DeactivateStakeArgs {
                stake_index,
                validator_index,
            },
        ),
    }
}

/// Merges two stake accounts delegated to the same validator.
pub fn merge_stakes(
    accounts: &ProtocolAccounts,
    destination_stake: Pubkey,
    source_stake: Pubkey,
    destination_stake_index: u32,
    source_stake_index: u32,
    validator_index: u32,
) -> Instruction {
    Instruction {
        program_id: accounts.program_id,
        accounts: vec![
            AccountMeta::new(accounts.state, false),
            AccountMeta::new(accounts.stake_list, false),
            AccountMeta::new(accounts.validator_list, false),
            AccountMeta::new(destination_stake, false),
            AccountMeta::new(source_stake, false),
            AccountMeta::new_readonly(accounts.stake_deposit_authority, false),
            AccountMeta::new_readonly(accounts.stake_withdraw_authority, false),
            AccountMeta::new(accounts.operational_sol_account, false),
            AccountMeta::new_readonly(sysvar::stake_history::id(), false),
            AccountMeta::new_readonly(stake::program::id(), false),
        ],
        data: instruction_data(
            "merge_stakes",
            &MergeStakesArgs {
                destination_stake_index,
                source_stake_index,
                validator_index,
            },
        ),
    }
}

/// Moves a delegation to another validator through fresh split and
/// redelegate stake accounts, both of which must co-sign.
#[allow(clippy::too_many_arguments)]
pub fn redelegate(
    accounts: &ProtocolAccounts,
    stake_account: Pubkey,
    split_stake_account: Pubkey,
    split_rent_payer: Pubkey,
    destination_validator_vote: Pubkey,
    redelegate_stake_account: Pubkey,
    stake_index: u32,
    source_validator_index: u32,
    destination_validator_index: u32,
) -> Instruction {
    Instruction {
        program_id: accounts.program_id,
        accounts: vec![
            AccountMeta::new(accounts.state, false),
            AccountMeta::new(accounts.validator_list, false),
            AccountMeta::new(accounts.stake_list, false),
            AccountMeta::new(stake_account, false),
            AccountMeta::new_readonly(accounts.stake_deposit_authority, false),
            AccountMeta::new(accounts.reserve_pda, false),
            AccountMeta::new(split_stake_account, true),
            AccountMeta::new(split_rent_payer, true),
            AccountMeta::new_readonly(destination_validator_vote, false),
            AccountMeta::new(redelegate_stake_account, true),
            AccountMeta::new_readonly(sysvar::stake_history::id(), false),
            #[allow(deprecated)]
            AccountMeta::new_readonly(stake::config::id(), false),
            AccountMeta::new_readonly(stake::program::id(), false),
        ],
        data: instruction_data(
            "redelegate",
            &RedelegateArgs {
                stake_index,
                source_validator_index,
                destination_validator_index,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{ProtocolAccounts, ProtocolAccountsConfig};

    fn accounts() -> ProtocolAccounts {
        let config = ProtocolAccountsConfig {
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
        };

        ProtocolAccounts::from_config(&config).unwrap()
    }

    #[test]
    fn discriminators_are_distinct_per_instruction() {
        let names = [
            "stake_reserve",
            "deactivate_stake",
            "update_active",
            "update_deactivated",
            "merge_stakes",
            "redelegate",
        ];

        for a in names {
            for b in names {
                if a != b {
                    assert_ne!(discriminator(a), discriminator(b));
                }
            }
        }
    }

    #[test]
    fn update_active_encodes_discriminator_and_args() {
        let accounts = accounts();
        let ix = update_active(&accounts, Pubkey::new_unique(), 3, 7);

        assert_eq!(ix.program_id, accounts.program_id);
        assert_eq!(&ix.data[..8], &discriminator("update_active"));
        // two u32 args after the discriminator
        assert_eq!(ix.data.len(), 8 + 8);
        assert_eq!(&ix.data[8..12], &3u32.to_le_bytes());
        assert_eq!(&ix.data[12..16], &7u32.to_le_bytes());
    }

    #[test]
    fn stake_reserve_requires_fresh_account_and_rent_payer_signatures() {
        let accounts = accounts();
        let stake_account = Pubkey::new_unique();
        let rent_payer = Pubkey::new_unique();
        let ix = stake_reserve(&accounts, Pubkey::new_unique(), stake_account, rent_payer, 0);

        let signers: Vec<_> = ix
            .accounts
            .iter()
            .filter(|meta| meta.is_signer)
            .map(|meta| meta.pubkey)
            .collect();
        assert_eq!(signers, vec![stake_account, rent_payer]);
    }

    #[test]
    fn deactivate_stake_signs_with_split_account() {
        let accounts = accounts();
        let split = Pubkey::new_unique();
        let ix = deactivate_stake(
            &accounts,
            Pubkey::new_unique(),
            split,
            Pubkey::new_unique(),
            1,
            2,
        );

        assert!(ix
            .accounts
            .iter()
            .any(|meta| meta.pubkey == split && meta.is_signer && meta.is_writable));
    }
}
