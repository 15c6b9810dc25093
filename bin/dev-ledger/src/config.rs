use std::time::Duration;

use credmirror_primitives::{buf::Address, constants::DEFAULT_MAX_BATCH_SIZE, types::ChainId};
use serde::{Deserialize, Serialize};

/// The configuration of a devnet node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Listen address of the JSON-RPC server.
    pub rpc_addr: String,

    /// Listen address of the REST attestation endpoint, if served.
    pub rest_addr: Option<String>,

    pub source: SourceLedgerConfig,

    pub destination: DestinationLedgerConfig,

    pub guardians: GuardianConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SourceLedgerConfig {
    pub chain_id: ChainId,

    /// Address of the emitter program.
    pub emitter: Address,

    /// Administrator of the emitter program.
    pub admin: Address,

    /// Fee charged per published message.
    pub message_fee: u64,

    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DestinationLedgerConfig {
    pub chain_id: ChainId,

    /// Administrator of the verifier program.
    pub admin: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct GuardianConfig {
    /// Index of the guardian set.
    #[serde(default)]
    pub set_index: u32,

    /// Hex-encoded secret keys, one per guardian, in guardian index order.
    pub secret_keys: Vec<String>,

    /// Time between a message's publication and its attestation becoming available.
    #[serde(default)]
    pub attestation_delay: Duration,
}

const fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_toml() {
        let config = r#"
            rpc_addr = "127.0.0.1:8545"
            rest_addr = "127.0.0.1:7071"

            [source]
            chain_id = 1
            emitter = "e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0"
            admin = "adadadadadadadadadadadadadadadadadadadadadadadadadadadadadadadad"
            message_fee = 10

            [destination]
            chain_id = 2
            admin = "adadadadadadadadadadadadadadadadadadadadadadadadadadadadadadadad"

            [guardians]
            secret_keys = [
                "0101010101010101010101010101010101010101010101010101010101010101",
                "0202020202020202020202020202020202020202020202020202020202020202",
            ]
            attestation_delay = { secs = 60, nanos = 0 }
        "#;

        let config = toml::from_str::<Config>(config);
        assert!(
            config.is_ok(),
            "must be able to deserialize config from toml but got: {}",
            config.unwrap_err()
        );

        let config = config.unwrap();
        assert_eq!(config.source.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
        assert_eq!(config.guardians.set_index, 0);
        assert_eq!(config.guardians.attestation_delay, Duration::from_secs(60));

        let serialized = toml::to_string(&config).unwrap();
        let deserialized = toml::from_str::<Config>(&serialized).unwrap();
        assert_eq!(deserialized, config);
    }
}
