//! The read-only delegation page source consumed by the batch executor.

use async_trait::async_trait;
use crank_primitives::delegation::DelegationPage;

use crate::errors::DbResult;

/// A paginated, stably-ordered source of stake delegation records.
///
/// Pages are 1-indexed. The ordering key is `staked_amount DESC, created_at
/// ASC`, which is stable over a snapshot so a full pass visits every record
/// exactly once. The underlying store may be written concurrently by the
/// ingestion pipeline; a record added mid-pass may or may not be visited in
/// the current pass and will be visited on the next epoch's pass.
#[async_trait]
pub trait DelegationStore {
    /// Fetches one page of delegation records along with the total record
    /// count at the time of the query.
    ///
    /// A `page` or `page_size` of zero is treated as one. A page past the end
    /// of the data yields an empty page with the true total.
    async fn delegations(&self, page: u64, page_size: u64) -> DbResult<DelegationPage>;
}
