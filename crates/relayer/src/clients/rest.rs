//! REST client for a guardian network's public attestation API.

use std::time::Duration;

use async_trait::async_trait;
use credmirror_primitives::types::MessageId;
use credmirror_rpc::types::Base64Bytes;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::trace;

use crate::{errors::FetchError, traits::AttestationSource};

/// Body of a successful `signed_vaa` lookup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedVaa {
    vaa_bytes: Base64Bytes,
}

/// Attestation service serving `GET {base}/v1/signed_vaa/{chain}/{emitter}/{sequence}`.
///
/// A `404` means quorum has not signed the message yet.
#[derive(Debug, Clone)]
pub struct RestAttestationSource {
    http: reqwest::Client,
    base_url: String,
}

impl RestAttestationSource {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { http, base_url })
    }

    fn url(&self, id: &MessageId) -> String {
        format!(
            "{}/v1/signed_vaa/{}/{}/{}",
            self.base_url, id.chain_id, id.emitter, id.sequence
        )
    }
}

#[async_trait]
impl AttestationSource for RestAttestationSource {
    async fn fetch(&self, id: MessageId) -> Result<Option<Vec<u8>>, FetchError> {
        let url = self.url(&id);
        trace!(%url, "looking up attestation");

        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let signed: SignedVaa = response.error_for_status()?.json().await?;
        Ok(Some(signed.vaa_bytes.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use credmirror_primitives::{buf::Address, types::ChainId};

    use super::*;

    #[test]
    fn url_uses_bare_hex_emitter() {
        let client = RestAttestationSource::new("http://guardians:7071/", Duration::from_secs(1))
            .unwrap();
        let id = MessageId {
            chain_id: ChainId(2),
            emitter: Address::new([0xab; 32]),
            sequence: 7,
        };

        assert_eq!(
            client.url(&id),
            format!("http://guardians:7071/v1/signed_vaa/2/{}/7", "ab".repeat(32))
        );
    }
}
