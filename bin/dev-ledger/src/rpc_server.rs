//! JSON-RPC server exposing the node's ledgers and guardian network.

use anyhow::Context;
use async_trait::async_trait;
use credmirror_primitives::{
    buf::{Address, AttestationDigest, ContentHash, ContentIdHash},
    types::{ChainId, MessageId},
};
use credmirror_programs::{
    emitter::{IssuanceRecord, SourceCalls},
    verifier::{DestinationCalls, MirroredRecord},
};
use credmirror_rpc::{
    errors::{internal_error, program_error},
    traits::{AttestationApiServer, DestinationLedgerApiServer, SourceLedgerApiServer},
    types::{Base64Bytes, RpcChainHead, RpcIssuanceEvent},
};
use jsonrpsee::{core::RpcResult, server::ServerBuilder, RpcModule};
use relayer::traits::AttestationSource;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::node::DevNode;

#[async_trait]
impl SourceLedgerApiServer for DevNode {
    async fn chain_head(&self) -> RpcResult<RpcChainHead> {
        let ledger = self.source.lock().await;

        Ok(RpcChainHead {
            chain_id: ledger.chain_id(),
            height: ledger.height(),
        })
    }

    async fn get_issuance_events(&self, from: u64, to: u64) -> RpcResult<Vec<RpcIssuanceEvent>> {
        let ledger = self.source.lock().await;

        Ok(ledger
            .events(from, to)
            .iter()
            .filter_map(RpcIssuanceEvent::from_logged)
            .collect())
    }

    async fn issue(
        &self,
        caller: Address,
        value: u64,
        identifier: String,
        content_hash: ContentHash,
    ) -> RpcResult<u64> {
        let sequence = self
            .source
            .lock()
            .await
            .issue(caller, value, &identifier, content_hash)
            .map_err(|err| program_error(&err))?;
        debug!(%identifier, %sequence, "issued credential");

        Ok(sequence)
    }

    async fn issue_batch(
        &self,
        caller: Address,
        value: u64,
        identifiers: Vec<String>,
        content_hashes: Vec<ContentHash>,
    ) -> RpcResult<Vec<u64>> {
        self.source
            .lock()
            .await
            .issue_batch(caller, value, &identifiers, &content_hashes)
            .map_err(|err| program_error(&err))
    }

    async fn revoke(&self, caller: Address, identifier: String) -> RpcResult<()> {
        SourceCalls::revoke(&mut *self.source.lock().await, caller, &identifier)
            .map_err(|err| program_error(&err))
    }

    async fn set_mirror_target(&self, caller: Address, target: Address) -> RpcResult<()> {
        self.source
            .lock()
            .await
            .set_mirror_target(caller, target)
            .map_err(|err| program_error(&err))
    }

    async fn get_issuance_record(&self, identifier: String) -> RpcResult<Option<IssuanceRecord>> {
        Ok(self
            .source
            .lock()
            .await
            .state()
            .emitter
            .record(&identifier)
            .copied())
    }

    async fn mirror_target(&self) -> RpcResult<Option<Address>> {
        Ok(self.source.lock().await.state().emitter.mirror_target())
    }
}

#[async_trait]
impl DestinationLedgerApiServer for DevNode {
    async fn submit_attestation(
        &self,
        caller: Address,
        attestation: Base64Bytes,
    ) -> RpcResult<MirroredRecord> {
        self.destination
            .lock()
            .await
            .submit(caller, attestation.as_ref())
            .map_err(|err| program_error(&err))
    }

    async fn revoke(&self, caller: Address, identifier: String) -> RpcResult<()> {
        DestinationCalls::revoke(&mut *self.destination.lock().await, caller, &identifier)
            .map_err(|err| program_error(&err))
    }

    async fn get_mirrored_record(
        &self,
        content_id_hash: ContentIdHash,
    ) -> RpcResult<Option<MirroredRecord>> {
        Ok(self
            .destination
            .lock()
            .await
            .state()
            .record(&content_id_hash)
            .copied())
    }

    async fn is_processed(&self, digest: AttestationDigest) -> RpcResult<bool> {
        Ok(self.destination.lock().await.state().is_processed(&digest))
    }
}

#[async_trait]
impl AttestationApiServer for DevNode {
    async fn get_signed_attestation(
        &self,
        chain: ChainId,
        emitter: Address,
        sequence: u64,
    ) -> RpcResult<Option<Base64Bytes>> {
        let id = MessageId {
            chain_id: chain,
            emitter,
            sequence,
        };

        let attestation = self
            .guardians
            .fetch(id)
            .await
            .map_err(|err| internal_error(err.to_string()))?;

        Ok(attestation.map(Base64Bytes))
    }
}

/// Builds the RPC module serving every namespace.
pub(crate) fn rpc_module(node: DevNode) -> anyhow::Result<RpcModule<DevNode>> {
    let mut rpc_module = RpcModule::new(node.clone());

    let source_api = SourceLedgerApiServer::into_rpc(node.clone());
    let destination_api = DestinationLedgerApiServer::into_rpc(node.clone());
    let attestation_api = AttestationApiServer::into_rpc(node);

    rpc_module.merge(source_api).context("merge source api")?;
    rpc_module
        .merge(destination_api)
        .context("merge destination api")?;
    rpc_module
        .merge(attestation_api)
        .context("merge attestation api")?;

    Ok(rpc_module)
}

/// Serves the RPC module at `rpc_addr` until `cancel` fires.
pub(crate) async fn start_rpc(
    node: DevNode,
    rpc_addr: &str,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let rpc_module = rpc_module(node)?;

    let rpc_server = ServerBuilder::new()
        .build(rpc_addr)
        .await
        .with_context(|| format!("bind rpc server to {rpc_addr}"))?;
    info!(addr = %rpc_server.local_addr()?, "rpc server listening");

    let rpc_handle = rpc_server.start(rpc_module);
    cancel.cancelled().await;

    info!("stopping rpc server");
    if rpc_handle.stop().is_err() {
        warn!("rpc server already stopped");
    }
    rpc_handle.stopped().await;

    Ok(())
}
