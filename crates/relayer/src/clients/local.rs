//! Clients driving ledgers and a guardian signer that live in the same process.
//!
//! These back the devnet node and the relayer's tests.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use credmirror_primitives::{buf::Address, types::MessageId};
use credmirror_programs::{
    emitter::SourceLedger,
    guardian::GuardianSigner,
    verifier::{DestinationCalls, DestinationLedger, MirroredRecord},
};
use credmirror_rpc::types::{RpcChainHead, RpcIssuanceEvent};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    errors::{FetchError, SourceError, SubmitError},
    traits::{AttestationSource, DestinationChain, SourceChain},
};

/// A source ledger shared between its users.
pub type SharedSourceLedger = Arc<Mutex<SourceLedger>>;

/// A destination ledger shared between its users.
pub type SharedDestinationLedger = Arc<Mutex<DestinationLedger>>;

/// Reads an in-process source ledger.
#[derive(Debug, Clone)]
pub struct LocalSourceChain {
    ledger: SharedSourceLedger,
}

impl LocalSourceChain {
    /// Wraps a shared source ledger.
    pub const fn new(ledger: SharedSourceLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl SourceChain for LocalSourceChain {
    async fn chain_head(&self) -> Result<RpcChainHead, SourceError> {
        let ledger = self.ledger.lock().await;

        Ok(RpcChainHead {
            chain_id: ledger.chain_id(),
            height: ledger.height(),
        })
    }

    async fn issuance_events(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<RpcIssuanceEvent>, SourceError> {
        let ledger = self.ledger.lock().await;

        Ok(ledger
            .events(from, to)
            .iter()
            .filter_map(RpcIssuanceEvent::from_logged)
            .collect())
    }
}

/// Submits to an in-process destination ledger as `submitter`.
#[derive(Debug, Clone)]
pub struct LocalDestinationChain {
    ledger: SharedDestinationLedger,
    submitter: Address,
}

impl LocalDestinationChain {
    /// Wraps a shared destination ledger.
    pub const fn new(ledger: SharedDestinationLedger, submitter: Address) -> Self {
        Self { ledger, submitter }
    }
}

#[async_trait]
impl DestinationChain for LocalDestinationChain {
    async fn submit(&self, attestation: Vec<u8>) -> Result<MirroredRecord, SubmitError> {
        let mut ledger = self.ledger.lock().await;
        Ok(ledger.submit(self.submitter, &attestation)?)
    }
}

/// A guardian network observing an in-process source ledger.
///
/// Messages become attestable `delay` after the timestamp of the block that published them.
/// The network can be taken offline, and individual messages can be withheld, to exercise the
/// relayer's retry paths.
#[derive(Debug)]
pub struct GuardianService {
    ledger: SharedSourceLedger,
    signer: GuardianSigner,
    delay: Duration,
    online: AtomicBool,
    withheld: Mutex<HashSet<MessageId>>,
}

impl GuardianService {
    /// Creates an online service signing with every key of `signer`.
    pub fn new(ledger: SharedSourceLedger, signer: GuardianSigner, delay: Duration) -> Self {
        Self {
            ledger,
            signer,
            delay,
            online: AtomicBool::new(true),
            withheld: Mutex::new(HashSet::new()),
        }
    }

    /// Makes lookups fail with [`FetchError::Unavailable`] while `online` is false.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Never signs `id`.
    pub async fn withhold(&self, id: MessageId) {
        self.withheld.lock().await.insert(id);
    }

    fn is_due(&self, published_at: u32) -> bool {
        if self.delay.is_zero() {
            return true;
        }

        let due = i64::from(published_at) + self.delay.as_secs() as i64;
        chrono::Utc::now().timestamp() >= due
    }
}

#[async_trait]
impl AttestationSource for GuardianService {
    async fn fetch(&self, id: MessageId) -> Result<Option<Vec<u8>>, FetchError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(FetchError::Unavailable("guardian network offline".to_string()));
        }

        if self.withheld.lock().await.contains(&id) {
            return Ok(None);
        }

        let ledger = self.ledger.lock().await;
        let Some(body) = ledger.state().bridge.published(&id) else {
            debug!(%id, "message not published");
            return Ok(None);
        };

        if !self.is_due(body.timestamp) {
            return Ok(None);
        }

        Ok(Some(self.signer.sign(body).to_bytes()))
    }
}
