//! Constants for the persistence layer.

use std::time::Duration;

/// The default number of times a failed query is retried before giving up.
pub const DEFAULT_MAX_RETRY_COUNT: usize = 3;

/// The default period to wait between query retries.
pub const DEFAULT_BACKOFF_PERIOD: Duration = Duration::from_millis(200);
