//! Drives one crank operation across every page of delegation records.

use std::{sync::Arc, time::Duration};

use crank_db::DelegationStore;
use crank_primitives::operations::CrankOperation;
use crank_submitter::{CrankTarget, TxSubmitter};
use tracing::{debug, info, warn};

use crate::errors::BatchError;

/// What a batch pass accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// How many records were attempted, successful or not.
    ///
    /// Best-effort metric only; the page-exhaustion check, not this count, is
    /// the authoritative termination signal.
    pub processed: u64,

    /// How many pages were fetched.
    pub pages: u64,
}

/// Fans one operation out over the delegation store, one transaction per
/// record, sequentially and in page order.
///
/// Per-record failures are logged and never abort the pass; only the page
/// source itself failing escapes as a [`BatchError`]. Submissions are never
/// issued concurrently, which keeps fee-payer blockhash handling race-free.
#[derive(Debug)]
pub struct BatchExecutor<S, T> {
    store: Arc<S>,
    submitter: Arc<T>,
    page_size: u64,
    inter_page_delay: Duration,
}

impl<S, T> BatchExecutor<S, T>
where
    S: DelegationStore + Send + Sync,
    T: TxSubmitter + Send + Sync,
{
    /// Creates a new executor over the given page source and submitter.
    pub fn new(
        store: Arc<S>,
        submitter: Arc<T>,
        page_size: u64,
        inter_page_delay: Duration,
    ) -> Self {
        Self {
            store,
            submitter,
            page_size,
            inter_page_delay,
        }
    }

    /// Runs `operation` once over every record the store currently holds.
    ///
    /// The total record count is captured from the first page only; an empty
    /// page terminates the pass immediately even when fewer than `total`
    /// records have been processed, which is the safety net against a total
    /// that went stale mid-pass.
    pub async fn run(&self, operation: CrankOperation) -> Result<BatchReport, BatchError> {
        let mut page = 1u64;
        let mut processed = 0u64;
        let mut total_snapshot = None;

        loop {
            let batch = self.store.delegations(page, self.page_size).await?;
            let total = *total_snapshot.get_or_insert(batch.total);

            if batch.records.is_empty() {
                debug!(%operation, page, "empty page, batch pass done");
                break;
            }

            for record in &batch.records {
                match CrankTarget::try_from(record) {
                    Ok(target) => {
                        match self.submitter.submit(operation, &target).await {
                            Ok(signature) => {
                                debug!(%operation, %target, %signature, "record processed")
                            }
                            // failure isolation: one bad record must not
                            // abort the batch
                            Err(e) => warn!(%operation, %target, %e, "record submission failed"),
                        }
                    }
                    Err(e) => warn!(%operation, %e, "skipping unusable record"),
                }

                processed += 1;
            }

            if processed >= total {
                break;
            }

            tokio::time::sleep(self.inter_page_delay).await;
            page += 1;
        }

        info!(%operation, processed, pages = page, "batch pass complete");

        Ok(BatchReport {
            processed,
            pages: page,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use crank_db::{
        errors::{DbError, DbResult},
        persistent::errors::StorageError,
    };
    use crank_primitives::delegation::{DelegationPage, StakeDelegationRecord};
    use crank_submitter::SubmitError;
    use parking_lot::Mutex;
    use solana_sdk::{pubkey::Pubkey, signature::Signature};

    use super::*;

    fn record(stake_index: i64) -> StakeDelegationRecord {
        let now = Utc::now();

        StakeDelegationRecord {
            stake_account: Some(Pubkey::new_unique().to_string()),
            stake_index: Some(stake_index),
            validator_account: Pubkey::new_unique().to_string(),
            validator_index: 0,
            staked_amount: Some(1_000_000),
            created_at: now,
            updated_at: now,
        }
    }

    /// Serves a fixed page script with an independently chosen total.
    struct ScriptedStore {
        pages: Vec<Vec<StakeDelegationRecord>>,
        total: u64,
        fetches: AtomicU64,
    }

    impl ScriptedStore {
        fn new(pages: Vec<Vec<StakeDelegationRecord>>, total: u64) -> Self {
            Self {
                pages,
                total,
                fetches: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl DelegationStore for ScriptedStore {
        async fn delegations(&self, page: u64, page_size: u64) -> DbResult<DelegationPage> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let records = self
                .pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_default();

            Ok(DelegationPage {
                total: self.total,
                page,
                page_size,
                records,
            })
        }
    }

    struct FailingStore;

    #[async_trait]
    impl DelegationStore for FailingStore {
        async fn delegations(&self, _page: u64, _page_size: u64) -> DbResult<DelegationPage> {
            Err(DbError::Storage(StorageError::InvalidData(
                "store offline".to_string(),
            )))
        }
    }

    /// Records every submission and fails the nth one if asked to.
    struct RecordingSubmitter {
        fail_on_call: Option<u64>,
        calls: AtomicU64,
        targets: Mutex<Vec<CrankTarget>>,
    }

    impl RecordingSubmitter {
        fn new(fail_on_call: Option<u64>) -> Self {
            Self {
                fail_on_call,
                calls: AtomicU64::new(0),
                targets: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TxSubmitter for RecordingSubmitter {
        async fn submit(
            &self,
            _operation: CrankOperation,
            target: &CrankTarget,
        ) -> Result<Signature, SubmitError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.targets.lock().push(*target);

            if self.fail_on_call == Some(call) {
                return Err(SubmitError::InvalidTarget("scripted failure".to_string()));
            }

            Ok(Signature::default())
        }
    }

    fn executor(
        store: ScriptedStore,
        submitter: RecordingSubmitter,
    ) -> BatchExecutor<ScriptedStore, RecordingSubmitter> {
        BatchExecutor::new(Arc::new(store), Arc::new(submitter), 10, Duration::ZERO)
    }

    #[tokio::test]
    async fn empty_first_page_terminates_without_submissions() {
        let store = ScriptedStore::new(vec![vec![]], 0);
        let submitter = Arc::new(RecordingSubmitter::new(None));
        let executor = BatchExecutor::new(Arc::new(store), submitter.clone(), 10, Duration::ZERO);

        let report = executor.run(CrankOperation::UpdateActive).await.unwrap();

        assert_eq!(report.processed, 0);
        assert_eq!(submitter.calls(), 0);
    }

    #[tokio::test]
    async fn stops_on_empty_page_despite_larger_total() {
        // total claims 25 records but only 20 exist across two pages
        let pages = vec![
            (0..10).map(record).collect(),
            (10..20).map(record).collect(),
            vec![],
        ];
        let store = ScriptedStore::new(pages, 25);
        let submitter = Arc::new(RecordingSubmitter::new(None));
        let executor = BatchExecutor::new(
            Arc::new(store),
            submitter.clone(),
            10,
            Duration::ZERO,
        );

        let report = executor.run(CrankOperation::UpdateActive).await.unwrap();

        assert_eq!(report.processed, 20);
        assert_eq!(report.pages, 3);
        assert_eq!(submitter.calls(), 20);
    }

    #[tokio::test]
    async fn one_failing_record_does_not_abort_the_batch() {
        let pages = vec![(0..5).map(record).collect()];
        let store = ScriptedStore::new(pages, 5);
        let submitter = Arc::new(RecordingSubmitter::new(Some(3)));
        let executor = BatchExecutor::new(
            Arc::new(store),
            submitter.clone(),
            10,
            Duration::ZERO,
        );

        let report = executor.run(CrankOperation::DeactivateStake).await.unwrap();

        assert_eq!(report.processed, 5);
        assert_eq!(submitter.calls(), 5);
    }

    #[tokio::test]
    async fn unusable_records_are_counted_but_not_submitted() {
        let mut broken = record(0);
        broken.stake_account = None;

        let pages = vec![vec![record(1), broken, record(2)]];
        let store = ScriptedStore::new(pages, 3);
        let submitter = Arc::new(RecordingSubmitter::new(None));
        let executor = BatchExecutor::new(
            Arc::new(store),
            submitter.clone(),
            10,
            Duration::ZERO,
        );

        let report = executor.run(CrankOperation::UpdateActive).await.unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(submitter.calls(), 2);
    }

    #[tokio::test]
    async fn processed_count_is_bounded_even_with_understated_total() {
        // total says 5 but the first page already holds 10; the count check
        // stops the pass after one page
        let pages = vec![(0..10).map(record).collect(), (10..20).map(record).collect()];
        let store = ScriptedStore::new(pages, 5);
        let submitter = RecordingSubmitter::new(None);
        let executor = executor(store, submitter);

        let report = executor.run(CrankOperation::UpdateActive).await.unwrap();

        assert_eq!(report.pages, 1);
        assert!(report.processed <= 5 + 10);
    }

    #[tokio::test]
    async fn page_source_failure_escapes_as_batch_error() {
        let submitter = Arc::new(RecordingSubmitter::new(None));
        let executor = BatchExecutor::new(
            Arc::new(FailingStore),
            submitter.clone(),
            10,
            Duration::ZERO,
        );

        let err = executor.run(CrankOperation::UpdateActive).await.unwrap_err();

        assert!(matches!(err, BatchError::PageSource(_)));
        assert_eq!(submitter.calls(), 0);
    }
}
