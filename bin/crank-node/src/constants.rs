use std::time::Duration;

pub(crate) const DEFAULT_THREAD_COUNT: u8 = 2;

pub(crate) const DEFAULT_THREAD_STACK_SIZE: usize = 8 * 1024 * 1024;

/// How often the scheduler's due-checks run unless configured otherwise.
pub(crate) const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(10);

/// Delegation records fetched per page unless configured otherwise.
pub(crate) const DEFAULT_PAGE_SIZE: u64 = 10;

/// Pause between delegation pages unless configured otherwise, to bound the
/// request rate against the ledger.
pub(crate) const DEFAULT_INTER_PAGE_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the manual-trigger queue between the RPC server and the
/// scheduler loop.
pub(crate) const TRIGGER_QUEUE_DEPTH: usize = 8;
