use std::{path::PathBuf, time::Duration};

use credmirror_db::persistent::config::DbConfig;
use credmirror_primitives::{
    buf::Address,
    types::{ChainId, EmitterKey},
};
use relayer::config::RelayerConfig;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_REQUEST_TIMEOUT;

/// The configuration of a relayer instance.
///
/// Nothing here is shared with other relayers: several instances with different settings may
/// race to deliver the same messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Config {
    /// The directory holding the relayer database.
    pub datadir: PathBuf,

    /// Where and what to watch on the source ledger.
    pub source: SourceConfig,

    /// Where to submit attestations.
    pub destination: DestinationConfig,

    /// Where to look attestations up.
    pub attestation: AttestationConfig,

    /// Tunables of the relay loop.
    #[serde(default)]
    pub relayer: RelayerConfig,

    /// The configuration for the sqlite3 database.
    #[serde(default)]
    pub db: DbConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SourceConfig {
    /// JSON-RPC endpoint of the source ledger.
    pub rpc_url: String,

    /// The source ledger's chain id.
    pub chain_id: ChainId,

    /// The emitter whose messages are relayed.
    pub emitter: Address,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
}

impl SourceConfig {
    pub(crate) const fn emitter_key(&self) -> EmitterKey {
        EmitterKey::new(self.chain_id, self.emitter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DestinationConfig {
    /// JSON-RPC endpoint of the destination ledger.
    pub rpc_url: String,

    /// The identity submissions are made as.
    pub submitter: Address,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
}

/// Protocol spoken by the attestation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AttestationKind {
    /// `GET /v1/signed_vaa/{chain}/{emitter}/{sequence}`.
    Rest,

    /// `attestation_getSignedAttestation`.
    Rpc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AttestationConfig {
    pub kind: AttestationKind,

    /// Base URL of the service.
    pub url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
}

const fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_toml() {
        let config = r#"
            datadir = ".data"

            [source]
            rpc_url = "http://localhost:8545"
            chain_id = 1
            emitter = "e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0"

            [destination]
            rpc_url = "http://localhost:8546"
            submitter = "0x4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e4e"
            request_timeout = { secs = 5, nanos = 0 }

            [attestation]
            kind = "rest"
            url = "https://guardians.example"

            [relayer]
            poll_interval = { secs = 30, nanos = 0 }
            max_attestation_attempts = 40
            start_height = 100

            [db]
            max_retry_count = 3
            backoff_period = { secs = 1, nanos = 0 }
        "#;

        let config = toml::from_str::<Config>(config);
        assert!(
            config.is_ok(),
            "must be able to deserialize config from toml but got: {}",
            config.unwrap_err()
        );

        let config = config.unwrap();
        assert_eq!(config.attestation.kind, AttestationKind::Rest);
        assert_eq!(config.source.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.relayer.start_height, Some(100));
        assert_eq!(config.source.emitter_key().chain_id, ChainId(1));

        let serialized = toml::to_string(&config).unwrap();
        let deserialized = toml::from_str::<Config>(&serialized).unwrap();
        assert_eq!(
            deserialized, config,
            "must be able to serialize and deserialize config to toml"
        );
    }

    #[test]
    fn unknown_attestation_kind_is_rejected() {
        let config = r#"
            datadir = ".data"
            source = { rpc_url = "http://a", chain_id = 1, emitter = "0x0000000000000000000000000000000000000000000000000000000000000001" }
            destination = { rpc_url = "http://b", submitter = "0x0000000000000000000000000000000000000000000000000000000000000002" }
            attestation = { kind = "grpc", url = "http://c" }
        "#;

        assert!(toml::from_str::<Config>(config).is_err());
    }
}
