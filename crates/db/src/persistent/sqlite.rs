//! SQLite implementation of the delegation page source.

use async_trait::async_trait;
use crank_primitives::delegation::{DelegationPage, StakeDelegationRecord};
use sqlx::SqlitePool;
use tracing::warn;

use super::{config::DbConfig, errors::StorageError, models::DelegationRow};
use crate::{
    delegation::DelegationStore,
    errors::{DbError, DbResult},
};

/// A [`DelegationStore`] over the `stake_delegations` table.
///
/// The table is owned and written by the event-ingestion pipeline; this store
/// reads it with a bounded retry loop so a transiently locked database does
/// not abort a crank pass.
#[derive(Debug, Clone)]
pub struct SqliteDelegationStore {
    pool: SqlitePool,
    config: DbConfig,
}

impl SqliteDelegationStore {
    /// Creates a new store over the given pool.
    pub fn new(pool: SqlitePool, config: DbConfig) -> Self {
        Self { pool, config }
    }

    /// Creates the `stake_delegations` table if it does not exist yet.
    ///
    /// In production the ingestion pipeline owns the schema; this is for dev
    /// setups and tests.
    pub async fn migrate(&self) -> DbResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS stake_delegations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                stake_account TEXT,
                stake_index INTEGER,
                validator_account TEXT NOT NULL,
                validator_index INTEGER NOT NULL,
                staked_amount INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(())
    }

    /// Inserts a delegation record. Used by tests and operator tooling only.
    pub async fn insert_delegation(&self, record: &StakeDelegationRecord) -> DbResult<()> {
        let staked_amount = record.staked_amount.map(|amount| amount as i64);

        sqlx::query(
            "INSERT INTO stake_delegations
                (stake_account, stake_index, validator_account, validator_index,
                 staked_amount, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&record.stake_account)
        .bind(record.stake_index)
        .bind(&record.validator_account)
        .bind(record.validator_index)
        .bind(staked_amount)
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(())
    }

    async fn fetch_page(&self, page: u64, page_size: u64) -> Result<DelegationPage, StorageError> {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let offset = (page - 1) * page_size;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stake_delegations")
            .fetch_one(&self.pool)
            .await?;

        // NULL sorts last under DESC in SQLite, so amount-less records come
        // at the end of the pass.
        let rows: Vec<DelegationRow> = sqlx::query_as(
            "SELECT stake_account, stake_index, validator_account, validator_index,
                    staked_amount, created_at, updated_at
                FROM stake_delegations
                ORDER BY staked_amount DESC, created_at ASC
                LIMIT $1 OFFSET $2",
        )
        .bind(page_size as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(StakeDelegationRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DelegationPage {
            total: total as u64,
            page,
            page_size,
            records,
        })
    }
}

#[async_trait]
impl DelegationStore for SqliteDelegationStore {
    async fn delegations(&self, page: u64, page_size: u64) -> DbResult<DelegationPage> {
        let mut attempts = 0;

        loop {
            match self.fetch_page(page, page_size).await {
                Ok(result) => return Ok(result),
                Err(StorageError::Driver(e)) if attempts < self.config.max_retry_count() => {
                    attempts += 1;
                    warn!(%attempts, err = %e, "delegation query failed, retrying");
                    tokio::time::sleep(self.config.backoff_period()).await;
                }
                Err(e) => return Err(DbError::Storage(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn test_store() -> SqliteDelegationStore {
        // A single connection keeps the in-memory database alive and shared.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("must connect to in-memory sqlite");

        let store = SqliteDelegationStore::new(pool, DbConfig::default());
        store.migrate().await.expect("must run migration");

        store
    }

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
    async fn paginates_in_staked_amount_order() {
        let store = test_store().await;

        for (index, amount) in [(0, Some(10)), (1, Some(30)), (2, None), (3, Some(20))] {
            store
                .insert_delegation(&record(index, amount))
                .await
                .unwrap();
        }

        let first = store.delegations(1, 2).await.unwrap();
        assert_eq!(first.total, 4);
        assert_eq!(
            first
                .records
                .iter()
                .map(|r| r.validator_index)
                .collect::<Vec<_>>(),
            vec![1, 3],
        );

        let second = store.delegations(2, 2).await.unwrap();
        // The NULL-amount record sorts last.
        assert_eq!(
            second
                .records
                .iter()
                .map(|r| r.validator_index)
                .collect::<Vec<_>>(),
            vec![0, 2],
        );
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_with_true_total() {
        let store = test_store().await;
        store.insert_delegation(&record(0, Some(1))).await.unwrap();

        let page = store.delegations(5, 10).await.unwrap();
        assert_eq!(page.total, 1);
        assert!(page.records.is_empty());
    }

    #[tokio::test]
    async fn zero_page_is_treated_as_first() {
        let store = test_store().await;
        store.insert_delegation(&record(0, Some(1))).await.unwrap();

        let page = store.delegations(0, 10).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.records.len(), 1);
    }

    #[tokio::test]
    async fn roundtrips_record_fields() {
        let store = test_store().await;
        let expected = record(7, Some(42));
        store.insert_delegation(&expected).await.unwrap();

        let page = store.delegations(1, 10).await.unwrap();
        assert_eq!(page.records, vec![expected]);
    }
}
