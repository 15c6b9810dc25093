//! JSON-RPC clients for the ledgers and the attestation service.

use std::time::Duration;

use async_trait::async_trait;
use credmirror_primitives::{buf::Address, types::MessageId};
use credmirror_programs::verifier::MirroredRecord;
use credmirror_rpc::{
    traits::{AttestationApiClient, DestinationLedgerApiClient, SourceLedgerApiClient},
    types::{Base64Bytes, RpcChainHead, RpcIssuanceEvent},
};
use jsonrpsee::{
    core::ClientError,
    http_client::{HttpClient, HttpClientBuilder},
};

use crate::{
    errors::{FetchError, SourceError, SubmitError},
    traits::{AttestationSource, DestinationChain, SourceChain},
};

fn http_client(url: &str, request_timeout: Duration) -> Result<HttpClient, ClientError> {
    HttpClientBuilder::default()
        .request_timeout(request_timeout)
        .build(url)
}

/// Source ledger reached over JSON-RPC.
#[derive(Debug, Clone)]
pub struct RpcSourceChain {
    client: HttpClient,
}

impl RpcSourceChain {
    /// Creates a client for the source ledger at `url`.
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client(url, request_timeout)?,
        })
    }
}

#[async_trait]
impl SourceChain for RpcSourceChain {
    async fn chain_head(&self) -> Result<RpcChainHead, SourceError> {
        Ok(self.client.chain_head().await?)
    }

    async fn issuance_events(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<RpcIssuanceEvent>, SourceError> {
        Ok(self.client.get_issuance_events(from, to).await?)
    }
}

/// Destination ledger reached over JSON-RPC, submitting as `submitter`.
#[derive(Debug, Clone)]
pub struct RpcDestinationChain {
    client: HttpClient,
    submitter: Address,
}

impl RpcDestinationChain {
    /// Creates a client for the destination ledger at `url`.
    pub fn new(url: &str, submitter: Address, request_timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client(url, request_timeout)?,
            submitter,
        })
    }
}

#[async_trait]
impl DestinationChain for RpcDestinationChain {
    async fn submit(&self, attestation: Vec<u8>) -> Result<MirroredRecord, SubmitError> {
        Ok(self
            .client
            .submit_attestation(self.submitter, Base64Bytes(attestation))
            .await?)
    }
}

/// Attestation service reached over JSON-RPC.
#[derive(Debug, Clone)]
pub struct RpcAttestationSource {
    client: HttpClient,
}

impl RpcAttestationSource {
    /// Creates a client for the attestation service at `url`.
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client(url, request_timeout)?,
        })
    }
}

#[async_trait]
impl AttestationSource for RpcAttestationSource {
    async fn fetch(&self, id: MessageId) -> Result<Option<Vec<u8>>, FetchError> {
        let attestation = self
            .client
            .get_signed_attestation(id.chain_id, id.emitter, id.sequence)
            .await?;

        Ok(attestation.map(Base64Bytes::into_inner))
    }
}
