//! Error types for parsing and decoding protocol data.

use thiserror::Error;

/// Error while parsing a 32-byte buffer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseBufError {
    /// The input is not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The input does not decode to exactly 32 bytes.
    #[error("expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Error while decoding a message body, payload or attestation from bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The input ended before a field could be read.
    #[error("unexpected end of input while reading {field}: need {needed} bytes, have {remaining}")]
    UnexpectedEof {
        /// The field being read.
        field: &'static str,

        /// Bytes required by the field.
        needed: usize,

        /// Bytes left in the input.
        remaining: usize,
    },

    /// The attestation version is not supported.
    #[error("unsupported attestation version {0}")]
    UnsupportedVersion(u8),

    /// The issuance payload does not have the fixed length.
    #[error("issuance payload must be {expected} bytes, got {actual}")]
    InvalidPayloadLength {
        /// The required length.
        expected: usize,

        /// The length found.
        actual: usize,
    },

    /// The attestation carries no signatures at all.
    #[error("attestation carries no signatures")]
    NoSignatures,
}
