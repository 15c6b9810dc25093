//! Identifiers for chains, emitters and messages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buf::Address;

/// Identifier of a ledger within the bridging network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChainId(pub u16);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for ChainId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// A message source: an emitter program on a given chain.
///
/// Sequence numbers are assigned per [`EmitterKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmitterKey {
    /// The chain the emitter lives on.
    pub chain_id: ChainId,

    /// The emitter program's address.
    pub address: Address,
}

impl EmitterKey {
    /// Creates a new [`EmitterKey`].
    pub const fn new(chain_id: ChainId, address: Address) -> Self {
        Self { chain_id, address }
    }

    /// Returns the [`MessageId`] of this emitter's message with the given sequence.
    pub const fn message(&self, sequence: u64) -> MessageId {
        MessageId {
            chain_id: self.chain_id,
            emitter: self.address,
            sequence,
        }
    }
}

impl fmt::Display for EmitterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chain_id, self.address)
    }
}

/// The `(chain, emitter, sequence)` triple under which the attestation service indexes a
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId {
    /// The chain the message was emitted on.
    pub chain_id: ChainId,

    /// The emitting program.
    pub emitter: Address,

    /// Sequence number assigned by the core bridge.
    pub sequence: u64,
}

impl MessageId {
    /// Returns the emitter part of this id.
    pub const fn emitter_key(&self) -> EmitterKey {
        EmitterKey::new(self.chain_id, self.emitter)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.chain_id, self.emitter, self.sequence)
    }
}
