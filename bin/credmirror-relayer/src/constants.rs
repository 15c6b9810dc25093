//! Constants for the relayer binary.

use std::time::Duration;

/// Timeout of a single request to a ledger or the attestation service.
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
