//! Errors raised by the relayer's clients and stages.

use credmirror_db::errors::DbError;
use credmirror_primitives::types::ChainId;
use credmirror_programs::errors::{ErrorKind, ProgramError};
use credmirror_rpc::errors::kind_of;
use jsonrpsee::core::ClientError;
use thiserror::Error;

/// Failure to read the source ledger.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The RPC call failed.
    #[error("source rpc: {0}")]
    Rpc(#[from] ClientError),

    /// The ledger could not be reached.
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Failure to look up an attestation.
///
/// "Not available yet" is not an error; lookups report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The RPC call failed.
    #[error("attestation rpc: {0}")]
    Rpc(#[from] ClientError),

    /// The HTTP request failed.
    #[error("attestation http: {0}")]
    Http(#[from] reqwest::Error),

    /// The service could not be reached.
    #[error("attestation service unavailable: {0}")]
    Unavailable(String),
}

/// Failure to submit an attestation to the destination ledger.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The verifier rejected the attestation.
    #[error("{kind:?}: {message}")]
    Program {
        /// What the verifier objected to.
        kind: ErrorKind,

        /// The verifier's explanation.
        message: String,
    },

    /// The RPC call failed before the verifier ruled on it.
    #[error("destination rpc: {0}")]
    Rpc(ClientError),
}

impl SubmitError {
    /// The program error kind, if the verifier ruled on the submission.
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Program { kind, .. } => Some(*kind),
            Self::Rpc(_) => None,
        }
    }
}

impl From<ProgramError> for SubmitError {
    fn from(err: ProgramError) -> Self {
        Self::Program {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<ClientError> for SubmitError {
    fn from(err: ClientError) -> Self {
        if let ClientError::Call(obj) = &err {
            if let Some(kind) = kind_of(obj.code()) {
                return Self::Program {
                    kind,
                    message: obj.message().to_string(),
                };
            }
        }

        Self::Rpc(err)
    }
}

/// Failure of a discovery poll. Any of these ends the discovery loop.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The source ledger failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The relay queue or cursor could not be accessed.
    #[error("relayer db: {0}")]
    Db(#[from] DbError),

    /// The configured source endpoint serves another chain.
    #[error("source ledger reports chain {actual}, expected {expected}")]
    WrongChain {
        /// The configured source chain.
        expected: ChainId,

        /// The chain the endpoint serves.
        actual: ChainId,
    },
}

/// Failure to obtain an attestation.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The attestation is not available yet.
    #[error("attestation not available yet")]
    NotAvailable,

    /// The lookup failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Every allowed lookup failed; the last failure is kept.
    #[error("no attestation after {attempts} attempts: {last}")]
    Exhausted {
        /// Lookups made.
        attempts: u32,

        /// Failure of the last lookup.
        last: Box<AcquisitionError>,
    },

    /// The relayer is shutting down.
    #[error("acquisition cancelled")]
    Cancelled,
}
