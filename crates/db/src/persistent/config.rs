//! Retry settings for database operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_BACKOFF_PERIOD, DEFAULT_MAX_RETRY_COUNT};

/// How transient SQLite failures (busy/locked database, pool timeouts) are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    max_retry_count: usize,
    backoff_period: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            max_retry_count: DEFAULT_MAX_RETRY_COUNT,
            backoff_period: DEFAULT_BACKOFF_PERIOD,
        }
    }
}

impl DbConfig {
    /// Sets the number of retries.
    pub const fn with_max_retry_count(self, count: usize) -> Self {
        Self {
            max_retry_count: count,
            ..self
        }
    }

    /// Sets the wait between retries.
    pub const fn with_backoff_period(self, period: Duration) -> Self {
        Self {
            backoff_period: period,
            ..self
        }
    }

    /// Number of retries after the first attempt.
    pub const fn max_retry_count(&self) -> usize {
        self.max_retry_count
    }

    /// Wait between retries.
    pub const fn backoff_period(&self) -> Duration {
        self.backoff_period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = DbConfig::default()
            .with_max_retry_count(2)
            .with_backoff_period(Duration::from_millis(10));

        assert_eq!(config.max_retry_count(), 2);
        assert_eq!(config.backoff_period(), Duration::from_millis(10));
        assert_eq!(
            DbConfig::default().max_retry_count(),
            DEFAULT_MAX_RETRY_COUNT
        );
    }
}
