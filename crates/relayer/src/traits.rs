//! The three parties the relayer talks to.

use std::fmt::Debug;

use async_trait::async_trait;
use credmirror_primitives::types::MessageId;
use credmirror_programs::verifier::MirroredRecord;
use credmirror_rpc::types::{RpcChainHead, RpcIssuanceEvent};

use crate::errors::{FetchError, SourceError, SubmitError};

/// Read access to the source ledger's event log.
#[async_trait]
pub trait SourceChain: Debug + Send + Sync {
    /// The chain id and latest block height.
    async fn chain_head(&self) -> Result<RpcChainHead, SourceError>;

    /// `CredentialIssued` events logged in blocks `from..=to`, of every emitter.
    async fn issuance_events(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<RpcIssuanceEvent>, SourceError>;
}

/// Lookup of signed attestations.
#[async_trait]
pub trait AttestationSource: Debug + Send + Sync {
    /// Returns the attestation of `id`, or `None` while quorum has not signed it.
    async fn fetch(&self, id: MessageId) -> Result<Option<Vec<u8>>, FetchError>;
}

/// Submission endpoint of the destination ledger's verifier.
#[async_trait]
pub trait DestinationChain: Debug + Send + Sync {
    /// Submits attestation bytes; returns the mirrored record they created.
    async fn submit(&self, attestation: Vec<u8>) -> Result<MirroredRecord, SubmitError>;
}
