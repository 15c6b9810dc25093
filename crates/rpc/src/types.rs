//! Types for the RPC server.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use credmirror_primitives::{
    buf::{Address, ContentHash, ContentIdHash},
    events::{LoggedEvent, SourceEvent},
    types::ChainId,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Opaque bytes carried as a base64 string.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    /// Returns the raw bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Base64Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Base64Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Base64Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Base64Bytes({} bytes)", self.0.len())
    }
}

impl Serialize for Base64Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map(Self).map_err(de::Error::custom)
    }
}

/// The current head of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcChainHead {
    /// The ledger's chain id.
    pub chain_id: ChainId,

    /// Height of the latest block.
    pub height: u64,
}

/// A `CredentialIssued` event: the relayer's discovery signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcIssuanceEvent {
    /// Block the event was logged in.
    pub block_height: u64,

    /// The emitting program.
    pub emitter: Address,

    /// Sequence of the published message.
    pub sequence: u64,

    /// The issuing identity.
    pub issuer: Address,

    /// Hash of the content identifier.
    pub content_id_hash: ContentIdHash,

    /// Hash of the credential content.
    pub content_hash: ContentHash,
}

impl RpcIssuanceEvent {
    /// Extracts the issuance event from a logged source event, if it is one.
    pub fn from_logged(logged: &LoggedEvent<SourceEvent>) -> Option<Self> {
        match logged.event {
            SourceEvent::CredentialIssued {
                content_id_hash,
                content_hash,
                issuer,
                emitter,
                sequence,
            } => Some(Self {
                block_height: logged.block_height,
                emitter,
                sequence,
                issuer,
                content_id_hash,
                content_hash,
            }),
            _ => None,
        }
    }
}
