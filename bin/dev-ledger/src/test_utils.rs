//! Fixtures shared by the node's tests.

use std::time::Duration;

use credmirror_primitives::{buf::Address, constants::DEFAULT_MAX_BATCH_SIZE, types::ChainId};

use crate::config::{Config, DestinationLedgerConfig, GuardianConfig, SourceLedgerConfig};

pub(crate) const EMITTER: Address = Address::new([0xe0; 32]);
pub(crate) const ADMIN: Address = Address::new([0xad; 32]);
pub(crate) const ISSUER: Address = Address::new([0x15; 32]);
pub(crate) const RELAYER: Address = Address::new([0x4e; 32]);

/// Chains 1 and 2, a fee of 10, three guardians and no attestation delay.
pub(crate) fn test_config() -> Config {
    Config {
        rpc_addr: "127.0.0.1:0".into(),
        rest_addr: None,
        source: SourceLedgerConfig {
            chain_id: ChainId(1),
            emitter: EMITTER,
            admin: ADMIN,
            message_fee: 10,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        },
        destination: DestinationLedgerConfig {
            chain_id: ChainId(2),
            admin: ADMIN,
        },
        guardians: GuardianConfig {
            set_index: 0,
            secret_keys: (1..=3u8).map(|i| format!("{i:02x}").repeat(32)).collect(),
            attestation_delay: Duration::ZERO,
        },
    }
}
