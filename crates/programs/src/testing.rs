//! Fixtures shared by the program tests.

use std::sync::Arc;

use credmirror_primitives::{
    buf::{Address, ContentHash},
    message::MessageBody,
    types::ChainId,
};
use secp256k1::SecretKey;

use crate::{
    core_bridge::CoreBridgeConfig,
    emitter::{EmitterConfig, SourceLedger, SourceState},
    guardian::GuardianSigner,
    verifier::{DestinationLedger, Verifier, VerifierConfig},
};

pub(crate) const SOURCE_CHAIN: ChainId = ChainId(1);
pub(crate) const DESTINATION_CHAIN: ChainId = ChainId(2);
pub(crate) const FEE: u64 = 10;

pub(crate) const EMITTER: Address = Address::new([0xe0; 32]);
pub(crate) const ADMIN: Address = Address::new([0xad; 32]);
pub(crate) const ISSUER: Address = Address::new([0x15; 32]);
pub(crate) const RELAYER: Address = Address::new([0x4e; 32]);

pub(crate) fn content_hash(n: u8) -> ContentHash {
    ContentHash::new([n; 32])
}

/// A signer for guardian set 0 with `n` deterministic keys.
pub(crate) fn guardian_signer(n: u8) -> GuardianSigner {
    let keys = (1..=n)
        .map(|i| SecretKey::from_slice(&[i; 32]).expect("small scalars are valid keys"))
        .collect();
    GuardianSigner::new(0, keys)
}

pub(crate) fn source_ledger() -> SourceLedger {
    SourceLedger::new(
        SOURCE_CHAIN,
        SourceState::new(
            CoreBridgeConfig { message_fee: FEE },
            EmitterConfig::new(EMITTER, ADMIN),
        ),
    )
}

pub(crate) fn destination_ledger(signer: &GuardianSigner) -> DestinationLedger {
    let config = VerifierConfig {
        expected_source_chain: SOURCE_CHAIN,
        trusted_emitter: EMITTER,
        admin: ADMIN,
    };
    DestinationLedger::new(
        DESTINATION_CHAIN,
        Verifier::new(config, Arc::new(signer.guardian_set())),
    )
}

pub(crate) fn sample_body(sequence: u64) -> MessageBody {
    MessageBody {
        timestamp: 1_700_000_000,
        nonce: 0,
        emitter_chain: SOURCE_CHAIN,
        emitter_address: EMITTER,
        sequence,
        consistency_level: 1,
        payload: vec![0; 64],
    }
}
