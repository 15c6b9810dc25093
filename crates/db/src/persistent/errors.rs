//! Persistent database errors.

use thiserror::Error;

/// Errors that can occur when interacting with the database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An error occurred when interacting with the SQLite database.
    #[error("sqlite: {0}")]
    Driver(#[from] sqlx::Error),

    /// A column held a value that does not convert to the domain type.
    #[error("conversion: {0}")]
    MismatchedTypes(String),

    /// A row referenced by the operation does not exist.
    #[error("data: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Whether the failure is a contention or connectivity issue worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Driver(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => true,
            Self::Driver(sqlx::Error::Database(err)) => err
                .code()
                .and_then(|code| code.parse::<u32>().ok())
                // primary result code: SQLITE_BUSY or SQLITE_LOCKED
                .is_some_and(|code| matches!(code & 0xff, 5 | 6)),
            _ => false,
        }
    }
}
