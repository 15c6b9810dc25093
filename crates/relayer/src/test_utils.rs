//! Fixtures shared by the relayer's unit tests.

use std::{sync::Arc, time::Duration};

use credmirror_db::relay::RelayerDb;
use credmirror_primitives::{
    buf::{Address, ContentHash},
    events::DestinationEvent,
    types::ChainId,
};
use credmirror_programs::{
    core_bridge::CoreBridgeConfig,
    emitter::{EmitterConfig, SourceCalls, SourceLedger, SourceState},
    guardian::GuardianSigner,
    verifier::{DestinationLedger, Verifier, VerifierConfig},
};
use secp256k1::SecretKey;
use tokio::sync::Mutex;

use crate::{
    acquisition::Acquisition,
    clients::local::{
        GuardianService, LocalDestinationChain, LocalSourceChain, SharedDestinationLedger,
        SharedSourceLedger,
    },
    delivery::Delivery,
    pool::RelayWorker,
    traits::{DestinationChain, SourceChain},
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

/// Both ledgers and a guardian network with three guardians and no signing delay.
pub(crate) struct Fixture {
    pub(crate) source: SharedSourceLedger,
    pub(crate) destination: SharedDestinationLedger,
    pub(crate) guardians: Arc<GuardianService>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let keys = (1..=3u8)
            .map(|i| SecretKey::from_slice(&[i; 32]).unwrap())
            .collect();
        let signer = GuardianSigner::new(0, keys);

        let source = Arc::new(Mutex::new(SourceLedger::new(
            SOURCE_CHAIN,
            SourceState::new(
                CoreBridgeConfig { message_fee: FEE },
                EmitterConfig::new(EMITTER, ADMIN),
            ),
        )));
        let verifier = Verifier::new(
            VerifierConfig {
                expected_source_chain: SOURCE_CHAIN,
                trusted_emitter: EMITTER,
                admin: ADMIN,
            },
            Arc::new(signer.guardian_set()),
        );
        let destination = Arc::new(Mutex::new(DestinationLedger::new(DESTINATION_CHAIN, verifier)));
        let guardians = Arc::new(GuardianService::new(source.clone(), signer, Duration::ZERO));

        Self {
            source,
            destination,
            guardians,
        }
    }

    pub(crate) fn source_chain(&self) -> Arc<dyn SourceChain> {
        Arc::new(LocalSourceChain::new(self.source.clone()))
    }

    pub(crate) fn destination_chain(&self) -> Arc<dyn DestinationChain> {
        Arc::new(LocalDestinationChain::new(self.destination.clone(), RELAYER))
    }

    pub(crate) fn worker<D>(&self, db: Arc<D>, max_attempts: u32) -> RelayWorker<D>
    where
        D: RelayerDb + Send + Sync + 'static,
    {
        RelayWorker::new(
            Acquisition::new(self.guardians.clone(), Duration::from_millis(10), max_attempts),
            Delivery::new(self.destination_chain()),
            db,
        )
    }

    /// Issues a credential as [`ISSUER`] and returns its sequence.
    pub(crate) async fn issue(&self, identifier: &str, hash: ContentHash) -> u64 {
        self.source
            .lock()
            .await
            .issue(ISSUER, FEE, identifier, hash)
            .unwrap()
    }

    /// Number of records mirrored on the destination ledger.
    pub(crate) async fn mirrored(&self) -> usize {
        let destination = self.destination.lock().await;
        destination
            .events(0, destination.height())
            .iter()
            .filter(|logged| matches!(logged.event, DestinationEvent::CredentialMirrored { .. }))
            .count()
    }
}
