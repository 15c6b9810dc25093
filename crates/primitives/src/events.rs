//! Events logged by the ledger programs.

use serde::{Deserialize, Serialize};

use crate::{
    buf::{Address, ContentHash, ContentIdHash},
    message::MessageBody,
};

/// Events logged on the source ledger by the emitter and the core bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceEvent {
    /// A credential was issued and a message describing it was published.
    CredentialIssued {
        /// Hash of the content identifier.
        content_id_hash: ContentIdHash,

        /// Hash of the credential content.
        content_hash: ContentHash,

        /// The issuing identity.
        issuer: Address,

        /// The emitting program.
        emitter: Address,

        /// Sequence assigned to the published message.
        sequence: u64,
    },

    /// The core bridge published a message.
    MessagePublished {
        /// The published body.
        body: MessageBody,
    },

    /// A credential was revoked on the source ledger.
    CredentialRevoked {
        /// Hash of the content identifier.
        content_id_hash: ContentIdHash,
    },

    /// The administrator changed the mirror target.
    MirrorTargetUpdated {
        /// The new target.
        target: Address,
    },
}

/// Events logged on the destination ledger by the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DestinationEvent {
    /// A mirrored record was created from an attestation.
    CredentialMirrored {
        /// Hash of the content identifier.
        content_id_hash: ContentIdHash,

        /// The issuer recorded on the source ledger.
        issuer: Address,

        /// Sequence of the consumed message.
        sequence: u64,
    },

    /// A mirrored record was revoked on the destination ledger.
    MirrorRevoked {
        /// Hash of the content identifier.
        content_id_hash: ContentIdHash,
    },
}

/// An event together with the height of the block that logged it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent<E> {
    /// Height of the block containing the transaction that logged the event.
    pub block_height: u64,

    /// The event.
    pub event: E,
}

impl SourceEvent {
    /// Returns the `(emitter, sequence)` announced by a [`SourceEvent::CredentialIssued`] event.
    pub const fn issued_sequence(&self) -> Option<(Address, u64)> {
        match self {
            Self::CredentialIssued {
                emitter, sequence, ..
            } => Some((*emitter, *sequence)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_in_json() {
        let event = SourceEvent::CredentialRevoked {
            content_id_hash: ContentIdHash::from_identifier("QmAAA"),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "credential_revoked");
        assert_eq!(serde_json::from_value::<SourceEvent>(json).unwrap(), event);
    }

    #[test]
    fn only_issuance_announces_a_sequence() {
        let emitter = Address::new([3; 32]);
        let issued = SourceEvent::CredentialIssued {
            content_id_hash: ContentIdHash::from_identifier("QmAAA"),
            content_hash: ContentHash::new([1; 32]),
            issuer: Address::new([2; 32]),
            emitter,
            sequence: 9,
        };

        assert_eq!(issued.issued_sequence(), Some((emitter, 9)));
        assert_eq!(
            SourceEvent::MirrorTargetUpdated { target: emitter }.issued_sequence(),
            None
        );
    }
}
