//! Errors surfaced by every [`RelayerDb`](crate::relay::RelayerDb) implementation.

use thiserror::Error;

use crate::{inmemory, persistent::errors::StorageError};

/// Database error.
#[derive(Debug, Error)]
pub enum DbError {
    /// The SQLite backend failed.
    #[error("sqlite: {0}")]
    Storage(#[from] StorageError),

    /// The in-memory backend failed.
    #[error("memory: {0}")]
    InMemory(#[from] inmemory::errors::InMemoryError),
}

impl DbError {
    /// Whether retrying the operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(err) => err.is_transient(),
            Self::InMemory(_) => false,
        }
    }
}

/// Result of a database operation.
pub type DbResult<T> = Result<T, DbError>;
