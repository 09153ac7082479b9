//! In-memory delegation page source.

use std::cmp::Ordering;

use async_trait::async_trait;
use crank_primitives::delegation::{DelegationPage, StakeDelegationRecord};
use parking_lot::RwLock;

use crate::{delegation::DelegationStore, errors::DbResult};

/// An in-memory [`DelegationStore`] with the same ordering semantics as the
/// SQLite store.
#[derive(Debug, Default)]
pub struct InMemoryDelegationStore {
    records: RwLock<Vec<StakeDelegationRecord>>,
}

impl InMemoryDelegationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record to the store.
    pub fn insert(&self, record: StakeDelegationRecord) {
        self.records.write().push(record);
    }

    /// Returns the number of records in the store.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

// `staked_amount DESC, created_at ASC` with amount-less records last, the
// same order SQLite produces (NULL sorts last under DESC).
fn page_order(a: &StakeDelegationRecord, b: &StakeDelegationRecord) -> Ordering {
    b.staked_amount
        .cmp(&a.staked_amount)
        .then_with(|| a.created_at.cmp(&b.created_at))
}

#[async_trait]
impl DelegationStore for InMemoryDelegationStore {
    async fn delegations(&self, page: u64, page_size: u64) -> DbResult<DelegationPage> {
        let page = page.max(1);
        let page_size = page_size.max(1);

        let mut records = self.records.read().clone();
        records.sort_by(page_order);

        let total = records.len() as u64;
        let start = ((page - 1) * page_size).min(total) as usize;
        let end = (start + page_size as usize).min(total as usize);

        Ok(DelegationPage {
            total,
            page,
            page_size,
            records: records[start..end].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(validator_index: i64, staked_amount: Option<u64>) -> StakeDelegationRecord {
        let created_at = Utc
            .timestamp_opt(1_700_000_000 + validator_index, 0)
            .unwrap();

        StakeDelegationRecord {
            stake_account: Some(format!("stake-{validator_index}")),
            stake_index: Some(validator_index),
            validator_account: format!("vote-{validator_index}"),
            validator_index,
            staked_amount,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn orders_and_paginates_like_sqlite() {
        let store = InMemoryDelegationStore::new();
        store.insert(record(0, Some(10)));
        store.insert(record(1, None));
        store.insert(record(2, Some(30)));

        let page = store.delegations(1, 10).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(
            page.records
                .iter()
                .map(|r| r.validator_index)
                .collect::<Vec<_>>(),
            vec![2, 0, 1],
        );
    }

    #[tokio::test]
    async fn equal_amounts_break_ties_by_creation_time() {
        let store = InMemoryDelegationStore::new();
        store.insert(record(5, Some(10)));
        store.insert(record(3, Some(10)));

        let page = store.delegations(1, 10).await.unwrap();
        assert_eq!(
            page.records
                .iter()
                .map(|r| r.validator_index)
                .collect::<Vec<_>>(),
            vec![3, 5],
        );
    }

    #[tokio::test]
    async fn out_of_range_page_is_empty() {
        let store = InMemoryDelegationStore::new();
        store.insert(record(0, Some(1)));

        let page = store.delegations(3, 10).await.unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.total, 1);
    }
}
