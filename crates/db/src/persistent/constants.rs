//! Persistence constants.

use std::time::Duration;

/// File name of the relayer database inside the data directory.
pub const DB_FILE_NAME: &str = "relayer.db";

/// Retries of a transient database failure before giving up.
pub const DEFAULT_MAX_RETRY_COUNT: usize = 5;

/// Wait between retries of a transient database failure.
pub const DEFAULT_BACKOFF_PERIOD: Duration = Duration::from_millis(500);
