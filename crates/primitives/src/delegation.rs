//! Stake delegation records as mirrored off chain by the event-ingestion
//! pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The off-chain mirror of an on-chain stake account's association with a
/// validator.
///
/// Records are produced by the (external) event-ingestion pipeline when stake
/// is reserved or deposited. The stake account fields are nullable because
/// some historical events were recorded before the stake account existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeDelegationRecord {
    /// The address of the stake account, if one has been created.
    pub stake_account: Option<String>,

    /// The index of the stake account in the on-chain stake list.
    pub stake_index: Option<i64>,

    /// The address of the validator's vote account.
    pub validator_account: String,

    /// The index of the validator in the on-chain validator list.
    pub validator_index: i64,

    /// The delegated amount in lamports.
    pub staked_amount: Option<u64>,

    /// When the record was first written.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// One page of stake delegation records.
///
/// Pages are 1-indexed and ordered by staked amount descending with creation
/// time ascending as the tiebreak, so that a full pass over a stable snapshot
/// visits every record exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationPage {
    /// The total number of records in the store at the time of the query.
    pub total: u64,

    /// The 1-indexed page number that was fetched.
    pub page: u64,

    /// The maximum number of records per page.
    pub page_size: u64,

    /// The records on this page, at most `page_size` of them.
    pub records: Vec<StakeDelegationRecord>,
}
