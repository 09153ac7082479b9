//! The crank operations and the scheduler families that group them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A single protocol-maintenance instruction that the crank node can submit
/// on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrankOperation {
    /// Delegates lamports from the reserve to a validator's stake account.
    StakeReserve,

    /// Deactivates (part of) a stake account, splitting off the remainder.
    DeactivateStake,

    /// Refreshes the pool's view of an active stake account's balance.
    UpdateActive,

    /// Sweeps a fully deactivated stake account back into the reserve.
    UpdateDeactivated,

    /// Consolidates two stake accounts delegated to the same validator.
    MergeStakes,

    /// Moves a delegation from one validator to another.
    Redelegate,
}

impl CrankOperation {
    /// The snake_case instruction name as it appears in the on-chain program.
    pub const fn instruction_name(&self) -> &'static str {
        match self {
            Self::StakeReserve => "stake_reserve",
            Self::DeactivateStake => "deactivate_stake",
            Self::UpdateActive => "update_active",
            Self::UpdateDeactivated => "update_deactivated",
            Self::MergeStakes => "merge_stakes",
            Self::Redelegate => "redelegate",
        }
    }
}

impl fmt::Display for CrankOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StakeReserve => "stakeReserve",
            Self::DeactivateStake => "deactivateStake",
            Self::UpdateActive => "updateActive",
            Self::UpdateDeactivated => "updateDeactivated",
            Self::MergeStakes => "mergeStakes",
            Self::Redelegate => "redelegate",
        };

        write!(f, "{name}")
    }
}

/// A group of crank operations that shares one epoch-eligibility record.
///
/// Each family runs at most once per epoch and holds the global run-guard for
/// the full duration of its (possibly multi-step) work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrankFamily {
    /// Splits and deactivates over-delegated stake near the epoch boundary.
    Deactivate,

    /// Reserves new stake for every validator in the configured set.
    StakeDelta,

    /// Updates active stake accounts, then sweeps deactivated ones, in strict
    /// sequence.
    UpdateCranks,
}

impl fmt::Display for CrankFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deactivate => "deactivate",
            Self::StakeDelta => "stakeDelta",
            Self::UpdateCranks => "updateCranks",
        };

        write!(f, "{name}")
    }
}

impl FromStr for CrankFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deactivate" => Ok(Self::Deactivate),
            "stakeDelta" => Ok(Self::StakeDelta),
            "updateCranks" => Ok(Self::UpdateCranks),
            _ => Err(format!("unknown crank family: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_roundtrips_through_display() {
        for family in [
            CrankFamily::Deactivate,
            CrankFamily::StakeDelta,
            CrankFamily::UpdateCranks,
        ] {
            let parsed = family.to_string().parse::<CrankFamily>();
            assert_eq!(parsed, Ok(family));
        }
    }

    #[test]
    fn operation_serializes_to_camel_case() {
        let json = serde_json::to_string(&CrankOperation::DeactivateStake).unwrap();
        assert_eq!(json, r#""deactivateStake""#);
    }
}
