//! The relayer's top-level loop.
//!
//! Discovery runs as a stream of polls. After every successful poll the pending part of the
//! relay queue is offered to the delivery pool. A failed poll ends the stream; the supervisor
//! then waits out the restart backoff and resubscribes, resuming from the persisted cursor. The
//! delivery pool is not affected by discovery restarts.

use std::sync::Arc;

use credmirror_db::relay::RelayerDb;
use credmirror_primitives::types::EmitterKey;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    acquisition::Acquisition,
    config::RelayerConfig,
    delivery::Delivery,
    discovery::Discovery,
    pool::{DeliveryPool, RelayWorker},
    traits::{AttestationSource, DestinationChain, SourceChain},
};

/// A configured relayer, ready to [`run`](Relayer::run).
#[derive(Debug)]
pub struct Relayer<D> {
    config: RelayerConfig,
    discovery: Discovery<D>,
    worker: RelayWorker<D>,
    db: Arc<D>,
}

impl<D> Relayer<D>
where
    D: RelayerDb + Send + Sync + 'static,
{
    /// Wires the relay stages for the emitter identified by `emitter`.
    pub fn new(
        config: RelayerConfig,
        emitter: EmitterKey,
        source: Arc<dyn SourceChain>,
        attestations: Arc<dyn AttestationSource>,
        destination: Arc<dyn DestinationChain>,
        db: Arc<D>,
    ) -> Self {
        let discovery = Discovery::new(source, db.clone(), emitter, config.start_height)
            .with_max_scan_blocks(config.scan_window());
        let worker = RelayWorker::new(
            Acquisition::new(
                attestations,
                config.attestation_retry_interval,
                config.max_attestation_attempts,
            ),
            Delivery::new(destination),
            db.clone(),
        );

        Self {
            config,
            discovery,
            worker,
            db,
        }
    }

    /// Relays until `cancel` fires, then waits for in-progress relays to stop.
    pub async fn run(self, cancel: CancellationToken) {
        let Self {
            config,
            discovery,
            worker,
            db,
        } = self;
        let emitter = discovery.emitter();

        let pool = DeliveryPool::spawn(
            worker,
            config.workers(),
            config.capacity(),
            cancel.child_token(),
        );
        let batch = config.dispatch_batch();

        info!(%emitter, workers = config.workers(), "relayer started");

        'supervise: loop {
            let mut polls = discovery
                .clone()
                .subscribe(config.poll_interval, cancel.child_token());

            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => break 'supervise,
                    next = polls.next() => next,
                };

                match next {
                    Some(Ok(outcome)) => {
                        if outcome.queued > 0 {
                            info!(queued = outcome.queued, cursor = outcome.cursor, "discovered new messages");
                        }

                        match db.pending_messages(emitter, batch).await {
                            Ok(pending) => {
                                let offered = pool.offer(pending).await;
                                debug!(%offered, "dispatched pending messages");
                            }
                            Err(err) => warn!(%err, "could not read the relay queue"),
                        }
                    }
                    Some(Err(err)) => {
                        error!(%err, "discovery failed");
                        break;
                    }
                    None => break,
                }
            }

            warn!(backoff = ?config.restart_backoff, "restarting discovery");
            tokio::select! {
                _ = cancel.cancelled() => break 'supervise,
                _ = tokio::time::sleep(config.restart_backoff) => {}
            }
        }

        info!("relayer shutting down");
        pool.join().await;
    }
}
