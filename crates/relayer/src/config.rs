//! Tunables of the relay loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default interval between discovery polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default interval between attestation lookups for one message.
pub const DEFAULT_ATTESTATION_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Default number of attestation lookups before a message is abandoned.
pub const DEFAULT_MAX_ATTESTATION_ATTEMPTS: u32 = 20;

/// Default pause before discovery is restarted after a provider failure.
pub const DEFAULT_RESTART_BACKOFF: Duration = Duration::from_secs(10);

/// Default number of source blocks fetched by one discovery request.
pub const DEFAULT_MAX_SCAN_BLOCKS: u64 = 100;

/// Configuration of a relayer instance.
///
/// Every field has a default, so a TOML `[relayer]` table only needs to name what it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayerConfig {
    /// Interval between discovery polls of the source ledger.
    pub poll_interval: Duration,

    /// Interval between attestation lookups while an attestation is not available.
    pub attestation_retry_interval: Duration,

    /// Attestation lookups made for a message before it is marked abandoned.
    pub max_attestation_attempts: u32,

    /// Pause before discovery restarts after the source ledger failed.
    pub restart_backoff: Duration,

    /// Number of messages relayed concurrently.
    pub max_concurrent_deliveries: usize,

    /// Messages buffered for the delivery workers. Pending messages beyond this stay in the
    /// relay queue until the next poll.
    pub queue_capacity: usize,

    /// Source blocks requested from the ledger at once. A relayer far behind the head catches
    /// up window by window, persisting the cursor after each.
    pub max_scan_blocks: u64,

    /// First source block to scan when no cursor is persisted.
    ///
    /// Without it, a fresh relayer starts at the current head and ignores history.
    pub start_height: Option<u64>,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            attestation_retry_interval: DEFAULT_ATTESTATION_RETRY_INTERVAL,
            max_attestation_attempts: DEFAULT_MAX_ATTESTATION_ATTEMPTS,
            restart_backoff: DEFAULT_RESTART_BACKOFF,
            max_concurrent_deliveries: 4,
            queue_capacity: 64,
            max_scan_blocks: DEFAULT_MAX_SCAN_BLOCKS,
            start_height: None,
        }
    }
}

impl RelayerConfig {
    /// Number of delivery workers, at least one.
    pub fn workers(&self) -> usize {
        self.max_concurrent_deliveries.max(1)
    }

    /// Capacity of the delivery channel, at least one.
    pub fn capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Blocks per discovery request, at least one.
    pub fn scan_window(&self) -> u64 {
        self.max_scan_blocks.max(1)
    }

    /// Pending entries read per dispatch: enough to fill the channel past entries already in
    /// flight.
    pub fn dispatch_batch(&self) -> usize {
        self.capacity()
            .saturating_mul(2)
            .saturating_add(self.workers())
    }
}
