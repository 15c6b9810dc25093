//! Protocol constants.

/// The only attestation wire format version understood by this workspace.
pub const ATTESTATION_VERSION: u8 = 1;

/// Length of a compact secp256k1 ECDSA signature inside an attestation.
pub const SIGNATURE_LEN: usize = 64;

/// Length of one signature entry: the guardian index followed by the signature.
pub const SIGNATURE_ENTRY_LEN: usize = 1 + SIGNATURE_LEN;

/// Length of the fixed part of a message body (everything before the payload).
pub const BODY_HEADER_LEN: usize = 4 + 4 + 2 + 32 + 8 + 1;

/// Length of an encoded issuance payload: issuer followed by the content identifier hash.
pub const ISSUANCE_PAYLOAD_LEN: usize = 64;

/// Default upper bound on the number of credentials issued in one batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Consistency level requesting that the message only be attested once the source transaction
/// is final.
pub const CONSISTENCY_FINALIZED: u8 = 1;
