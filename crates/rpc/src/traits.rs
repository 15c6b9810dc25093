//! Traits for the RPC server.
//!
//! Calls that change ledger state carry the caller's identity explicitly; devnet nodes take it at
//! face value.

use credmirror_primitives::{
    buf::{Address, AttestationDigest, ContentHash, ContentIdHash},
    types::ChainId,
};
use credmirror_programs::{emitter::IssuanceRecord, verifier::MirroredRecord};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

use crate::types::{Base64Bytes, RpcChainHead, RpcIssuanceEvent};

/// RPCs of the source ledger, hosting the emitter program.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "source"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "source"))]
pub trait SourceLedgerApi {
    /// Get the chain id and the height of the latest block.
    #[method(name = "chainHead")]
    async fn chain_head(&self) -> RpcResult<RpcChainHead>;

    /// Get `CredentialIssued` events logged in blocks `from..=to`.
    #[method(name = "getIssuanceEvents")]
    async fn get_issuance_events(&self, from: u64, to: u64) -> RpcResult<Vec<RpcIssuanceEvent>>;

    /// Issue a credential; returns the sequence of the published message.
    #[method(name = "issue")]
    async fn issue(
        &self,
        caller: Address,
        value: u64,
        identifier: String,
        content_hash: ContentHash,
    ) -> RpcResult<u64>;

    /// Issue a batch of credentials atomically; returns one sequence per pair.
    #[method(name = "issueBatch")]
    async fn issue_batch(
        &self,
        caller: Address,
        value: u64,
        identifiers: Vec<String>,
        content_hashes: Vec<ContentHash>,
    ) -> RpcResult<Vec<u64>>;

    /// Revoke a credential on the source ledger.
    #[method(name = "revoke")]
    async fn revoke(&self, caller: Address, identifier: String) -> RpcResult<()>;

    /// Set the destination-side program address.
    #[method(name = "setMirrorTarget")]
    async fn set_mirror_target(&self, caller: Address, target: Address) -> RpcResult<()>;

    /// Get the issuance record of a content identifier.
    #[method(name = "getIssuanceRecord")]
    async fn get_issuance_record(&self, identifier: String) -> RpcResult<Option<IssuanceRecord>>;

    /// Get the configured mirror target.
    #[method(name = "mirrorTarget")]
    async fn mirror_target(&self) -> RpcResult<Option<Address>>;
}

/// RPCs of the destination ledger, hosting the verifier program.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "destination"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "destination"))]
pub trait DestinationLedgerApi {
    /// Submit an attestation; returns the mirrored record it created.
    #[method(name = "submitAttestation")]
    async fn submit_attestation(
        &self,
        caller: Address,
        attestation: Base64Bytes,
    ) -> RpcResult<MirroredRecord>;

    /// Revoke a mirrored record.
    #[method(name = "revoke")]
    async fn revoke(&self, caller: Address, identifier: String) -> RpcResult<()>;

    /// Get the mirrored record of a content identifier hash.
    #[method(name = "getMirroredRecord")]
    async fn get_mirrored_record(
        &self,
        content_id_hash: ContentIdHash,
    ) -> RpcResult<Option<MirroredRecord>>;

    /// Whether an attestation digest was consumed.
    #[method(name = "isProcessed")]
    async fn is_processed(&self, digest: AttestationDigest) -> RpcResult<bool>;
}

/// RPCs of the attestation service.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "attestation"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "attestation"))]
pub trait AttestationApi {
    /// Get the signed attestation of a message, or `None` while quorum has not signed it yet.
    #[method(name = "getSignedAttestation")]
    async fn get_signed_attestation(
        &self,
        chain: ChainId,
        emitter: Address,
        sequence: u64,
    ) -> RpcResult<Option<Base64Bytes>>;
}
