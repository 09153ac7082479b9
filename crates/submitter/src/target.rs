//! The per-record identity a crank transaction is built from.

use std::{fmt, str::FromStr};

use crank_primitives::delegation::StakeDelegationRecord;
use solana_sdk::pubkey::Pubkey;

use crate::errors::SubmitError;

/// What a single crank transaction operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrankTarget {
    /// A validator from the configured set, for `stake_reserve`.
    Reserve {
        /// The validator's index in the on-chain validator list.
        validator_index: u32,

        /// The validator's vote account.
        validator_vote: Pubkey,
    },

    /// A stake delegation record, for the per-record operations.
    Delegation {
        /// The stake account to operate on.
        stake_account: Pubkey,

        /// The stake account's index in the on-chain stake list.
        stake_index: u32,

        /// The validator's index in the on-chain validator list.
        validator_index: u32,

        /// The validator's vote account.
        validator_vote: Pubkey,
    },
}

impl fmt::Display for CrankTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserve { validator_vote, .. } => write!(f, "validator {validator_vote}"),
            Self::Delegation { stake_account, .. } => write!(f, "stake account {stake_account}"),
        }
    }
}

fn index_as_u32(name: &str, index: i64) -> Result<u32, SubmitError> {
    u32::try_from(index).map_err(|_| SubmitError::InvalidTarget(format!("{name} {index}")))
}

impl TryFrom<&StakeDelegationRecord> for CrankTarget {
    type Error = SubmitError;

    fn try_from(record: &StakeDelegationRecord) -> Result<Self, Self::Error> {
        let stake_account = record
            .stake_account
            .as_deref()
            .ok_or_else(|| SubmitError::InvalidTarget("record has no stake account".to_string()))?;
        let stake_account = Pubkey::from_str(stake_account).map_err(|e| {
            SubmitError::InvalidTarget(format!("bad stake account {stake_account}: {e}"))
        })?;

        let stake_index = record
            .stake_index
            .ok_or_else(|| SubmitError::InvalidTarget("record has no stake index".to_string()))?;

        let validator_vote = Pubkey::from_str(&record.validator_account).map_err(|e| {
            SubmitError::InvalidTarget(format!(
                "bad validator account {}: {e}",
                record.validator_account
            ))
        })?;

        Ok(Self::Delegation {
            stake_account,
            stake_index: index_as_u32("stake index", stake_index)?,
            validator_index: index_as_u32("validator index", record.validator_index)?,
            validator_vote,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn record() -> StakeDelegationRecord {
        let now = Utc::now();

        StakeDelegationRecord {
            stake_account: Some(Pubkey::new_unique().to_string()),
            stake_index: Some(4),
            validator_account: Pubkey::new_unique().to_string(),
            validator_index: 9,
            staked_amount: Some(1_000_000),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn converts_complete_record() {
        let record = record();
        let target = CrankTarget::try_from(&record).unwrap();

        match target {
            CrankTarget::Delegation {
                stake_index,
                validator_index,
                ..
            } => {
                assert_eq!(stake_index, 4);
                assert_eq!(validator_index, 9);
            }
            other => panic!("expected delegation target, got {other}"),
        }
    }

    #[test]
    fn rejects_record_without_stake_account() {
        let mut record = record();
        record.stake_account = None;

        assert!(matches!(
            CrankTarget::try_from(&record),
            Err(SubmitError::InvalidTarget(_))
        ));
    }

    #[test]
    fn rejects_negative_stake_index() {
        let mut record = record();
        record.stake_index = Some(-1);

        assert!(matches!(
            CrankTarget::try_from(&record),
            Err(SubmitError::InvalidTarget(_))
        ));
    }
}
