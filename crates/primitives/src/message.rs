//! The cross-chain message body published by the core bridge and the issuance payload it
//! carries.
//!
//! All integers are big-endian.

use serde::{Deserialize, Serialize};

use crate::{
    buf::{Address, AttestationDigest, ContentIdHash, BUF32_LEN},
    constants::{BODY_HEADER_LEN, ISSUANCE_PAYLOAD_LEN},
    errors::CodecError,
    types::{ChainId, EmitterKey, MessageId},
};

/// Sequential reader over a byte slice that reports which field ran out of input.
#[derive(Debug)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    pub(crate) const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub(crate) fn take(&mut self, field: &'static str, n: usize) -> Result<&'a [u8], CodecError> {
        if self.data.len() < n {
            return Err(CodecError::UnexpectedEof {
                field,
                needed: n,
                remaining: self.data.len(),
            });
        }

        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    pub(crate) fn array<const N: usize>(
        &mut self,
        field: &'static str,
    ) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(field, N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        Ok(self.array::<1>(field)?[0])
    }

    pub(crate) fn u16(&mut self, field: &'static str) -> Result<u16, CodecError> {
        Ok(u16::from_be_bytes(self.array(field)?))
    }

    pub(crate) fn u32(&mut self, field: &'static str) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.array(field)?))
    }

    pub(crate) fn u64(&mut self, field: &'static str) -> Result<u64, CodecError> {
        Ok(u64::from_be_bytes(self.array(field)?))
    }

    pub(crate) const fn rest(self) -> &'a [u8] {
        self.data
    }
}

/// The body of a cross-chain message, i.e. everything an attestation signs over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    /// Timestamp of the block the message was published in.
    pub timestamp: u32,

    /// Nonce supplied by the emitter.
    pub nonce: u32,

    /// Chain the message was emitted on.
    pub emitter_chain: ChainId,

    /// The emitting program.
    pub emitter_address: Address,

    /// Per-emitter sequence number.
    pub sequence: u64,

    /// Finality requested before guardians sign.
    pub consistency_level: u8,

    /// Application payload.
    pub payload: Vec<u8>,
}

impl MessageBody {
    /// Returns the `(chain, emitter, sequence)` id of this message.
    pub const fn id(&self) -> MessageId {
        MessageId {
            chain_id: self.emitter_chain,
            emitter: self.emitter_address,
            sequence: self.sequence,
        }
    }

    /// Returns the emitter of this message.
    pub const fn emitter_key(&self) -> EmitterKey {
        EmitterKey::new(self.emitter_chain, self.emitter_address)
    }

    /// Encodes the body into its wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BODY_HEADER_LEN + self.payload.len());
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(&self.emitter_chain.0.to_be_bytes());
        out.extend_from_slice(self.emitter_address.as_bytes());
        out.extend_from_slice(&self.sequence.to_be_bytes());
        out.push(self.consistency_level);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Decodes a body from its wire form. Everything after the fixed header is the payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(bytes);

        let timestamp = reader.u32("timestamp")?;
        let nonce = reader.u32("nonce")?;
        let emitter_chain = ChainId(reader.u16("emitter_chain")?);
        let emitter_address = Address::new(reader.array("emitter_address")?);
        let sequence = reader.u64("sequence")?;
        let consistency_level = reader.u8("consistency_level")?;
        let payload = reader.rest().to_vec();

        Ok(Self {
            timestamp,
            nonce,
            emitter_chain,
            emitter_address,
            sequence,
            consistency_level,
            payload,
        })
    }

    /// Computes the digest guardians sign and the verifier uses for replay protection.
    pub fn digest(&self) -> AttestationDigest {
        AttestationDigest::of_body(&self.to_bytes())
    }
}

/// The application payload of an issuance message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuancePayload {
    /// The identity that issued the credential on the source ledger.
    pub issuer: Address,

    /// Hash of the credential's content identifier.
    pub content_id_hash: ContentIdHash,
}

impl IssuancePayload {
    /// Encodes the payload as `issuer || content_id_hash`.
    pub fn to_bytes(&self) -> [u8; ISSUANCE_PAYLOAD_LEN] {
        let mut out = [0u8; ISSUANCE_PAYLOAD_LEN];
        out[..BUF32_LEN].copy_from_slice(self.issuer.as_bytes());
        out[BUF32_LEN..].copy_from_slice(self.content_id_hash.as_bytes());
        out
    }

    /// Decodes a payload, rejecting anything that is not exactly [`ISSUANCE_PAYLOAD_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != ISSUANCE_PAYLOAD_LEN {
            return Err(CodecError::InvalidPayloadLength {
                expected: ISSUANCE_PAYLOAD_LEN,
                actual: bytes.len(),
            });
        }

        let mut reader = Reader::new(bytes);
        let issuer = Address::new(reader.array("issuer")?);
        let content_id_hash = ContentIdHash::new(reader.array("content_id_hash")?);

        Ok(Self {
            issuer,
            content_id_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::test_utils::{arb_address, arb_message_body};

    #[test]
    fn body_layout_is_big_endian() {
        let body = MessageBody {
            timestamp: 0x0102_0304,
            nonce: 7,
            emitter_chain: ChainId(2),
            emitter_address: Address::new([0xee; BUF32_LEN]),
            sequence: 0x0a,
            consistency_level: 1,
            payload: vec![0xaa, 0xbb],
        };

        let bytes = body.to_bytes();
        assert_eq!(bytes.len(), BODY_HEADER_LEN + 2);
        assert_eq!(&bytes[..4], &[1, 2, 3, 4]);
        assert_eq!(&bytes[8..10], &[0, 2]);
        assert_eq!(&bytes[42..50], &[0, 0, 0, 0, 0, 0, 0, 0x0a]);
        assert_eq!(bytes[50], 1);
        assert_eq!(&bytes[51..], &[0xaa, 0xbb]);
    }

    #[test]
    fn truncated_body_names_missing_field() {
        let body = MessageBody {
            timestamp: 0,
            nonce: 0,
            emitter_chain: ChainId(1),
            emitter_address: Address::ZERO,
            sequence: 0,
            consistency_level: 1,
            payload: vec![],
        };
        let bytes = body.to_bytes();

        let err = MessageBody::from_bytes(&bytes[..20]).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedEof {
                field: "emitter_address",
                needed: 32,
                remaining: 10,
            }
        );
    }

    #[test]
    fn payload_rejects_wrong_lengths() {
        for len in [0, 32, 63, 65, 128] {
            let err = IssuancePayload::from_bytes(&vec![0u8; len]).unwrap_err();
            assert_eq!(
                err,
                CodecError::InvalidPayloadLength {
                    expected: ISSUANCE_PAYLOAD_LEN,
                    actual: len
                }
            );
        }
    }

    proptest! {
        #[test]
        fn body_decodes_what_it_encodes(body in arb_message_body()) {
            let decoded = MessageBody::from_bytes(&body.to_bytes()).unwrap();
            prop_assert_eq!(decoded, body);
        }

        #[test]
        fn payload_decodes_what_it_encodes(issuer in arb_address(), id in any::<[u8; 32]>()) {
            let payload = IssuancePayload { issuer, content_id_hash: ContentIdHash::new(id) };
            prop_assert_eq!(IssuancePayload::from_bytes(&payload.to_bytes()).unwrap(), payload);
        }

        #[test]
        fn digest_ignores_nothing_in_body(body in arb_message_body(), flip in 0usize..BODY_HEADER_LEN) {
            let mut bytes = body.to_bytes();
            bytes[flip] ^= 0x01;
            prop_assert_ne!(AttestationDigest::of_body(&bytes), body.digest());
        }
    }
}
