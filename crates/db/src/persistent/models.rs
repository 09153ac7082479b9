//! Row models for the SQLite-backed store.

use chrono::{DateTime, Utc};
use crank_primitives::delegation::StakeDelegationRecord;
use sqlx::FromRow;

use super::errors::StorageError;

/// A raw row from the `stake_delegations` table.
#[derive(Debug, Clone, FromRow)]
pub(super) struct DelegationRow {
    pub(super) stake_account: Option<String>,
    pub(super) stake_index: Option<i64>,
    pub(super) validator_account: String,
    pub(super) validator_index: i64,
    pub(super) staked_amount: Option<i64>,
    pub(super) created_at: String,
    pub(super) updated_at: String,
}

impl TryFrom<DelegationRow> for StakeDelegationRecord {
    type Error = StorageError;

    fn try_from(row: DelegationRow) -> Result<Self, Self::Error> {
        let staked_amount = row
            .staked_amount
            .map(|amount| {
                u64::try_from(amount).map_err(|_| {
                    StorageError::InvalidData(format!("negative staked amount: {amount}"))
                })
            })
            .transpose()?;

        Ok(StakeDelegationRecord {
            stake_account: row.stake_account,
            stake_index: row.stake_index,
            validator_account: row.validator_account,
            validator_index: row.validator_index,
            staked_amount,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidData(format!("bad timestamp {raw}: {e}")))
}
