//! Guardian-set attestation verification and signing.
//!
//! Guardians sign the attestation digest (`SHA-256(SHA-256(body))`) with secp256k1 ECDSA. An
//! attestation is valid for a [`GuardianSet`] when it names the set's index, its guardian indices
//! are strictly increasing and in range, it carries at least a quorum of signatures and every
//! signature verifies.

use std::fmt::Debug;

use credmirror_primitives::{
    attestation::{Attestation, GuardianSignature},
    errors::CodecError,
    message::MessageBody,
};
use secp256k1::{ecdsa::Signature, Message, PublicKey, SecretKey, SECP256K1};
use thiserror::Error;

/// Errors raised while verifying an attestation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The bytes are not a well-formed attestation.
    #[error("malformed attestation: {0}")]
    Malformed(#[from] CodecError),

    /// The attestation was signed by a different guardian set.
    #[error("signed by guardian set {actual}, expected {expected}")]
    WrongGuardianSet {
        /// The trusted set's index.
        expected: u32,

        /// The index named in the attestation.
        actual: u32,
    },

    /// Not enough signatures to reach quorum.
    #[error("{have} signatures, quorum is {need}")]
    NoQuorum {
        /// Signatures present.
        have: usize,

        /// Signatures required.
        need: usize,
    },

    /// A signature names a guardian outside the set.
    #[error("guardian index {0} out of range")]
    GuardianIndexOutOfRange(u8),

    /// Guardian indices are not strictly increasing.
    #[error("guardian indices not strictly increasing at index {0}")]
    UnorderedSignatures(u8),

    /// A signature does not verify.
    #[error("signature of guardian {0} does not verify")]
    InvalidSignature(u8),
}

/// The bridge verification primitive the destination ledger trusts.
pub trait AttestationVerifier: Debug + Send + Sync {
    /// Parses and authenticates `bytes`, returning the attestation on success.
    fn verify(&self, bytes: &[u8]) -> Result<Attestation, VerifyError>;
}

/// A guardian set: the public keys whose quorum signs attestations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianSet {
    index: u32,
    keys: Vec<PublicKey>,
}

impl GuardianSet {
    /// Creates a guardian set.
    pub const fn new(index: u32, keys: Vec<PublicKey>) -> Self {
        Self { index, keys }
    }

    /// The set's index.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// The guardians' public keys, by guardian index.
    pub fn keys(&self) -> &[PublicKey] {
        &self.keys
    }

    /// Number of signatures required: `⌊2n/3⌋ + 1`.
    pub fn quorum(&self) -> usize {
        self.keys.len() * 2 / 3 + 1
    }
}

impl AttestationVerifier for GuardianSet {
    fn verify(&self, bytes: &[u8]) -> Result<Attestation, VerifyError> {
        let attestation = Attestation::parse(bytes)?;

        if attestation.guardian_set_index != self.index {
            return Err(VerifyError::WrongGuardianSet {
                expected: self.index,
                actual: attestation.guardian_set_index,
            });
        }

        let need = self.quorum();
        if attestation.signatures.len() < need {
            return Err(VerifyError::NoQuorum {
                have: attestation.signatures.len(),
                need,
            });
        }

        let message = Message::from_digest(*attestation.digest().as_bytes());
        let mut last: Option<u8> = None;

        for GuardianSignature {
            guardian_index,
            signature,
        } in &attestation.signatures
        {
            if last.is_some_and(|prev| *guardian_index <= prev) {
                return Err(VerifyError::UnorderedSignatures(*guardian_index));
            }
            last = Some(*guardian_index);

            let key = self
                .keys
                .get(*guardian_index as usize)
                .ok_or(VerifyError::GuardianIndexOutOfRange(*guardian_index))?;

            let sig = Signature::from_compact(signature)
                .map_err(|_| VerifyError::InvalidSignature(*guardian_index))?;

            SECP256K1
                .verify_ecdsa(&message, &sig, key)
                .map_err(|_| VerifyError::InvalidSignature(*guardian_index))?;
        }

        Ok(attestation)
    }
}

/// Holds guardian secret keys and produces attestations.
///
/// This stands in for the guardian network on devnets and in tests.
#[derive(Clone)]
pub struct GuardianSigner {
    index: u32,
    keys: Vec<SecretKey>,
}

impl Debug for GuardianSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardianSigner")
            .field("index", &self.index)
            .field("guardians", &self.keys.len())
            .finish()
    }
}

impl GuardianSigner {
    /// Creates a signer for guardian set `index`.
    pub const fn new(index: u32, keys: Vec<SecretKey>) -> Self {
        Self { index, keys }
    }

    /// Returns the public guardian set matching this signer.
    pub fn guardian_set(&self) -> GuardianSet {
        GuardianSet::new(
            self.index,
            self.keys
                .iter()
                .map(|sk| PublicKey::from_secret_key(SECP256K1, sk))
                .collect(),
        )
    }

    /// Signs `body` with every guardian.
    pub fn sign(&self, body: &MessageBody) -> Attestation {
        let all: Vec<u8> = (0..self.keys.len()).map(|i| i as u8).collect();
        self.sign_with(body, &all)
    }

    /// Signs `body` with the guardians at `indices`, in the given order.
    ///
    /// Indices without a key are skipped.
    pub fn sign_with(&self, body: &MessageBody, indices: &[u8]) -> Attestation {
        let digest = body.digest();
        let message = Message::from_digest(*digest.as_bytes());

        let signatures = indices
            .iter()
            .filter_map(|&guardian_index| {
                let sk = self.keys.get(guardian_index as usize)?;
                Some(GuardianSignature {
                    guardian_index,
                    signature: SECP256K1.sign_ecdsa(&message, sk).serialize_compact(),
                })
            })
            .collect();

        Attestation {
            guardian_set_index: self.index,
            signatures,
            body: body.clone(),
        }
    }
}
