//! REST endpoint serving signed attestations the way public guardian APIs do.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use credmirror_primitives::{
    buf::Address,
    types::{ChainId, MessageId},
};
use credmirror_rpc::types::Base64Bytes;
use relayer::traits::AttestationSource;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::node::DevNode;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedVaa {
    vaa_bytes: Base64Bytes,
}

/// Builds the attestation router.
pub(crate) fn router(node: DevNode) -> Router {
    Router::new()
        .route(
            "/v1/signed_vaa/{chain}/{emitter}/{sequence}",
            get(signed_vaa),
        )
        .with_state(node)
}

/// GET /v1/signed_vaa/{chain}/{emitter}/{sequence}: `404` until the message is attestable.
async fn signed_vaa(
    State(node): State<DevNode>,
    Path((chain, emitter, sequence)): Path<(u16, String, u64)>,
) -> Response {
    let Ok(emitter) = emitter.parse::<Address>() else {
        return (StatusCode::BAD_REQUEST, "emitter must be 32 hex-encoded bytes").into_response();
    };
    let id = MessageId {
        chain_id: ChainId(chain),
        emitter,
        sequence,
    };

    match node.guardians.fetch(id).await {
        Ok(Some(attestation)) => Json(SignedVaa {
            vaa_bytes: Base64Bytes(attestation),
        })
        .into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            warn!(%id, %err, "attestation lookup failed");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
        }
    }
}

/// Serves the attestation router at `addr` until `cancel` fires.
pub(crate) async fn start_rest(
    node: DevNode,
    addr: &str,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind rest server to {addr}"))?;
    info!(addr = %listener.local_addr()?, "rest server listening");

    axum::serve(listener, router(node))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("rest server")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use credmirror_primitives::{attestation::Attestation, buf::ContentHash};
    use credmirror_programs::emitter::SourceCalls;
    use relayer::clients::rest::RestAttestationSource;

    use super::*;
    use crate::test_utils::{test_config, EMITTER, ISSUER};

    #[tokio::test]
    async fn serves_attestations_to_the_rest_client() {
        let node = DevNode::from_config(&test_config()).unwrap();
        let sequence = node
            .source
            .lock()
            .await
            .issue(ISSUER, 10, "QmAAA", ContentHash::new([1; 32]))
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let cancel = CancellationToken::new();
        let server = {
            let cancel = cancel.clone();
            let app = router(node.clone());
            tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move { cancel.cancelled().await })
                    .await
            })
        };

        let client = RestAttestationSource::new(url, Duration::from_secs(5)).unwrap();
        let id = MessageId {
            chain_id: ChainId(1),
            emitter: EMITTER,
            sequence,
        };

        let bytes = client.fetch(id).await.unwrap().unwrap();
        let attestation = Attestation::parse(&bytes).unwrap();
        assert_eq!(attestation.body.sequence, sequence);
        assert_eq!(attestation.body.emitter_address, EMITTER);

        let unknown = MessageId {
            sequence: sequence + 1,
            ..id
        };
        assert!(client.fetch(unknown).await.unwrap().is_none());

        node.guardians.set_online(false);
        assert!(client.fetch(id).await.is_err());

        cancel.cancel();
        server.await.unwrap().unwrap();
    }
}
