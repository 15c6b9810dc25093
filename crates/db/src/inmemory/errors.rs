//! In-memory database errors.

use credmirror_primitives::types::MessageId;
use thiserror::Error;

/// Errors raised by the in-memory backend.
#[derive(Debug, Error)]
pub enum InMemoryError {
    /// The message has no relay queue entry.
    #[error("no relay entry for {0}")]
    NotFound(MessageId),
}
