//! Attestation wire format.
//!
//! ```text
//! version u8 | guardian_set_index u32 | signature_count u8
//!   | signature_count × (guardian_index u8 | signature [64])
//!   | body
//! ```
//!
//! This module only frames the bytes. Whether the signatures are valid is decided by the
//! verifier the destination ledger trusts.

use crate::{
    buf::AttestationDigest,
    constants::{ATTESTATION_VERSION, SIGNATURE_ENTRY_LEN, SIGNATURE_LEN},
    errors::CodecError,
    message::{MessageBody, Reader},
};

/// A single guardian's signature over an attestation digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardianSignature {
    /// Position of the signer within the guardian set.
    pub guardian_index: u8,

    /// Compact `r || s` ECDSA signature.
    pub signature: [u8; SIGNATURE_LEN],
}

/// A parsed attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    /// Index of the guardian set that signed.
    pub guardian_set_index: u32,

    /// Signatures, in the order they appear on the wire.
    pub signatures: Vec<GuardianSignature>,

    /// The signed message body.
    pub body: MessageBody,
}

impl Attestation {
    /// Parses an attestation from its wire form.
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(bytes);

        let version = reader.u8("version")?;
        if version != ATTESTATION_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let guardian_set_index = reader.u32("guardian_set_index")?;
        let count = reader.u8("signature_count")?;
        if count == 0 {
            return Err(CodecError::NoSignatures);
        }

        let signatures = (0..count)
            .map(|_| {
                Ok(GuardianSignature {
                    guardian_index: reader.u8("guardian_index")?,
                    signature: reader.array("signature")?,
                })
            })
            .collect::<Result<Vec<_>, CodecError>>()?;

        let body = MessageBody::from_bytes(reader.rest())?;

        Ok(Self {
            guardian_set_index,
            signatures,
            body,
        })
    }

    /// Encodes the attestation into its wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = self.body.to_bytes();
        let mut out = Vec::with_capacity(6 + self.signatures.len() * SIGNATURE_ENTRY_LEN + body.len());

        out.push(ATTESTATION_VERSION);
        out.extend_from_slice(&self.guardian_set_index.to_be_bytes());
        out.push(self.signatures.len() as u8);
        for sig in &self.signatures {
            out.push(sig.guardian_index);
            out.extend_from_slice(&sig.signature);
        }
        out.extend_from_slice(&body);

        out
    }

    /// The digest of the signed body.
    ///
    /// Two attestations of the same message carrying different signature subsets share this
    /// digest.
    pub fn digest(&self) -> AttestationDigest {
        self.body.digest()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::test_utils::arb_message_body;

    fn sig(guardian_index: u8) -> GuardianSignature {
        GuardianSignature {
            guardian_index,
            signature: [guardian_index; SIGNATURE_LEN],
        }
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = vec![2u8];
        bytes.extend_from_slice(&[0; 64]);

        assert_eq!(
            Attestation::parse(&bytes).unwrap_err(),
            CodecError::UnsupportedVersion(2)
        );
    }

    #[test]
    fn rejects_empty_signature_list() {
        let bytes = [ATTESTATION_VERSION, 0, 0, 0, 0, 0];
        assert_eq!(
            Attestation::parse(&bytes).unwrap_err(),
            CodecError::NoSignatures
        );
    }

    #[test]
    fn rejects_truncated_signature() {
        let mut bytes = vec![ATTESTATION_VERSION, 0, 0, 0, 0, 1, 0];
        bytes.extend_from_slice(&[0; 10]);

        assert!(matches!(
            Attestation::parse(&bytes).unwrap_err(),
            CodecError::UnexpectedEof {
                field: "signature",
                ..
            }
        ));
    }

    proptest! {
        #[test]
        fn parse_inverts_to_bytes(
            body in arb_message_body(),
            set_index in any::<u32>(),
            n in 1u8..20,
        ) {
            let attestation = Attestation {
                guardian_set_index: set_index,
                signatures: (0..n).map(sig).collect(),
                body,
            };

            let parsed = Attestation::parse(&attestation.to_bytes()).unwrap();
            prop_assert_eq!(parsed, attestation);
        }

        #[test]
        fn digest_is_independent_of_signatures(body in arb_message_body(), n in 1u8..5) {
            let full = Attestation { guardian_set_index: 0, signatures: (0..n).map(sig).collect(), body: body.clone() };
            let single = Attestation { guardian_set_index: 0, signatures: vec![sig(0)], body };
            prop_assert_eq!(full.digest(), single.digest());
        }
    }
}
