//! Failures of ledger program calls.
//!
//! A failed call aborts its own transaction and nothing else.

use credmirror_primitives::{
    buf::{Address, AttestationDigest, ContentIdHash},
    types::ChainId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the emitter and verifier programs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// The content identifier already has an issuance record.
    #[error("content identifier {0} already issued")]
    DuplicateIdentifier(ContentIdHash),

    /// The content hash already backs another content identifier.
    #[error("content hash already bound to identifier {0}")]
    DuplicateContent(ContentIdHash),

    /// No record exists for the content identifier.
    #[error("no record for content identifier {0}")]
    NotFound(ContentIdHash),

    /// The record is already revoked.
    #[error("record for {0} already revoked")]
    AlreadyRevoked(ContentIdHash),

    /// The caller is not the administrator.
    #[error("caller {0} is not authorized")]
    Unauthorized(Address),

    /// The null address was given where a real target is required.
    #[error("mirror target must not be the null address")]
    NullTarget,

    /// A batch call carried no items.
    #[error("batch is empty")]
    EmptyBatch,

    /// A batch call exceeded the configured bound.
    #[error("batch of {size} exceeds the maximum of {max}")]
    BatchTooLarge {
        /// Number of items in the batch.
        size: usize,

        /// Configured bound.
        max: usize,
    },

    /// Parallel batch arrays have different lengths.
    #[error("{identifiers} identifiers but {hashes} content hashes")]
    LengthMismatch {
        /// Number of identifiers.
        identifiers: usize,

        /// Number of content hashes.
        hashes: usize,
    },

    /// The attached value does not cover the message fee.
    #[error("insufficient fee: required {required}, provided {provided}")]
    InsufficientFee {
        /// Total fee for the call.
        required: u64,

        /// Value attached to the call.
        provided: u64,
    },

    /// The content identifier is the empty string.
    #[error("content identifier must not be empty")]
    EmptyIdentifier,

    /// The attestation failed verification.
    #[error("invalid attestation: {0}")]
    InvalidAttestation(String),

    /// The attested message comes from a chain other than the expected source.
    #[error("message from chain {actual}, expected {expected}")]
    WrongSourceChain {
        /// The configured source chain.
        expected: ChainId,

        /// The chain named in the message.
        actual: ChainId,
    },

    /// The attested message was not emitted by the trusted emitter.
    #[error("untrusted emitter {0}")]
    UntrustedEmitter(Address),

    /// The attestation digest was consumed before.
    #[error("attestation {0} already processed")]
    AlreadyProcessed(AttestationDigest),

    /// The message payload could not be decoded.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A mirrored record already exists for the content identifier.
    #[error("content identifier {0} already mirrored")]
    AlreadyMirrored(ContentIdHash),
}

/// Payload-free discriminant of a [`ProgramError`].
///
/// This is what crosses process boundaries: clients classify failures by kind, never by message
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ErrorKind {
    DuplicateIdentifier,
    DuplicateContent,
    NotFound,
    AlreadyRevoked,
    Unauthorized,
    NullTarget,
    EmptyBatch,
    BatchTooLarge,
    LengthMismatch,
    InsufficientFee,
    EmptyIdentifier,
    InvalidAttestation,
    WrongSourceChain,
    UntrustedEmitter,
    AlreadyProcessed,
    InvalidPayload,
    AlreadyMirrored,
}

/// Coarse classification of program failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// The call's inputs are malformed or conflict with existing state.
    Validation,

    /// The caller is not allowed to make the call.
    Authorization,

    /// The attestation is invalid or does not come from the trusted source.
    Provenance,

    /// The call's effect is already in place.
    Idempotence,
}

impl ErrorKind {
    /// Every kind, in code order.
    pub const ALL: [ErrorKind; 17] = [
        ErrorKind::DuplicateIdentifier,
        ErrorKind::DuplicateContent,
        ErrorKind::NotFound,
        ErrorKind::AlreadyRevoked,
        ErrorKind::Unauthorized,
        ErrorKind::NullTarget,
        ErrorKind::EmptyBatch,
        ErrorKind::BatchTooLarge,
        ErrorKind::LengthMismatch,
        ErrorKind::InsufficientFee,
        ErrorKind::EmptyIdentifier,
        ErrorKind::InvalidAttestation,
        ErrorKind::WrongSourceChain,
        ErrorKind::UntrustedEmitter,
        ErrorKind::AlreadyProcessed,
        ErrorKind::InvalidPayload,
        ErrorKind::AlreadyMirrored,
    ];

    /// Returns the class of this kind.
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Unauthorized => ErrorClass::Authorization,
            Self::InvalidAttestation | Self::WrongSourceChain | Self::UntrustedEmitter => {
                ErrorClass::Provenance
            }
            Self::AlreadyProcessed | Self::AlreadyMirrored | Self::AlreadyRevoked => {
                ErrorClass::Idempotence
            }
            _ => ErrorClass::Validation,
        }
    }
}

impl ProgramError {
    /// Returns the payload-free kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateIdentifier(_) => ErrorKind::DuplicateIdentifier,
            Self::DuplicateContent(_) => ErrorKind::DuplicateContent,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyRevoked(_) => ErrorKind::AlreadyRevoked,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NullTarget => ErrorKind::NullTarget,
            Self::EmptyBatch => ErrorKind::EmptyBatch,
            Self::BatchTooLarge { .. } => ErrorKind::BatchTooLarge,
            Self::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            Self::InsufficientFee { .. } => ErrorKind::InsufficientFee,
            Self::EmptyIdentifier => ErrorKind::EmptyIdentifier,
            Self::InvalidAttestation(_) => ErrorKind::InvalidAttestation,
            Self::WrongSourceChain { .. } => ErrorKind::WrongSourceChain,
            Self::UntrustedEmitter(_) => ErrorKind::UntrustedEmitter,
            Self::AlreadyProcessed(_) => ErrorKind::AlreadyProcessed,
            Self::InvalidPayload(_) => ErrorKind::InvalidPayload,
            Self::AlreadyMirrored(_) => ErrorKind::AlreadyMirrored,
        }
    }

    /// Returns the class of this error.
    pub const fn class(&self) -> ErrorClass {
        self.kind().class()
    }
}

/// Result of a program call.
pub type ProgramResult<T> = Result<T, ProgramError>;
