//! The ledgers and guardian network hosted by a devnet node.

use std::{str::FromStr, sync::Arc};

use anyhow::Context;
use credmirror_programs::{
    core_bridge::CoreBridgeConfig,
    emitter::{EmitterConfig, SourceLedger, SourceState},
    guardian::GuardianSigner,
    verifier::{DestinationLedger, Verifier, VerifierConfig},
};
use relayer::clients::local::{GuardianService, SharedDestinationLedger, SharedSourceLedger};
use secp256k1::SecretKey;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::Config;

/// Shared handles to everything the node serves. Clones share state.
#[derive(Debug, Clone)]
pub(crate) struct DevNode {
    pub(crate) source: SharedSourceLedger,
    pub(crate) destination: SharedDestinationLedger,
    pub(crate) guardians: Arc<GuardianService>,
}

impl DevNode {
    /// Creates both ledgers at genesis and the guardian network described by `config`.
    pub(crate) fn from_config(config: &Config) -> anyhow::Result<Self> {
        let keys = config
            .guardians
            .secret_keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                SecretKey::from_str(key.trim_start_matches("0x"))
                    .with_context(|| format!("guardian key {i}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        if keys.is_empty() || keys.len() > usize::from(u8::MAX) {
            anyhow::bail!("need between 1 and 255 guardian keys, got {}", keys.len());
        }
        let signer = GuardianSigner::new(config.guardians.set_index, keys);

        let mut emitter = EmitterConfig::new(config.source.emitter, config.source.admin);
        emitter.max_batch_size = config.source.max_batch_size;
        let source = SourceLedger::new(
            config.source.chain_id,
            SourceState::new(
                CoreBridgeConfig {
                    message_fee: config.source.message_fee,
                },
                emitter,
            ),
        );

        let verifier = Verifier::new(
            VerifierConfig {
                expected_source_chain: config.source.chain_id,
                trusted_emitter: config.source.emitter,
                admin: config.destination.admin,
            },
            Arc::new(signer.guardian_set()),
        );
        let destination = DestinationLedger::new(config.destination.chain_id, verifier);

        info!(
            source = %config.source.chain_id,
            destination = %config.destination.chain_id,
            guardians = config.guardians.secret_keys.len(),
            "ledgers created at genesis"
        );

        let source = Arc::new(Mutex::new(source));
        Ok(Self {
            guardians: Arc::new(GuardianService::new(
                source.clone(),
                signer,
                config.guardians.attestation_delay,
            )),
            source,
            destination: Arc::new(Mutex::new(destination)),
        })
    }
}
