//! Bounded pool of workers relaying queued messages.
//!
//! Discovery hands pending entries to the pool with [`DeliveryPool::offer`], which never waits:
//! entries that do not fit in the channel stay pending in the relay queue and are offered again
//! on the next poll. The in-flight set keeps this process from working one message twice
//! concurrently.

use std::{collections::HashSet, sync::Arc};

use credmirror_db::relay::{RelayEntry, RelayStatus, RelayerDb};
use credmirror_primitives::types::MessageId;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{acquisition::Acquisition, delivery::Delivery, errors::AcquisitionError};

/// Relays one message at a time: acquisition, then delivery, then the status update.
#[derive(Debug)]
pub struct RelayWorker<D> {
    acquisition: Acquisition,
    delivery: Delivery,
    db: Arc<D>,
}

impl<D> RelayWorker<D>
where
    D: RelayerDb + Send + Sync + 'static,
{
    /// Creates a worker recording outcomes in `db`.
    pub const fn new(acquisition: Acquisition, delivery: Delivery, db: Arc<D>) -> Self {
        Self {
            acquisition,
            delivery,
            db,
        }
    }

    /// Relays `entry` and records the outcome.
    ///
    /// Returns `None` if `cancel` fired before the outcome was known; the entry then stays
    /// pending.
    pub async fn relay(&self, entry: &RelayEntry, cancel: &CancellationToken) -> Option<RelayStatus> {
        let id = entry.id;

        let (status, attempts) = match self.acquisition.acquire(id, cancel).await {
            Ok(acquired) => {
                debug!(%id, attempts = acquired.attempts, "attestation acquired");
                let status = self.delivery.deliver(id, acquired.attestation).await;
                (status, acquired.attempts)
            }
            Err(AcquisitionError::Exhausted { attempts, last }) => {
                warn!(%id, %attempts, %last, "abandoning message, attestation never became available");
                (RelayStatus::Abandoned { attempts }, attempts)
            }
            Err(err) => {
                debug!(%id, %err, "relay interrupted");
                return None;
            }
        };

        if let Err(err) = self
            .db
            .update_relay_status(id, status.clone(), attempts)
            .await
        {
            // the entry stays pending and is relayed again after a restart
            error!(%id, %status, %err, "failed to record relay outcome");
        }

        Some(status)
    }
}

/// Fixed set of [`RelayWorker`]s fed by a bounded channel.
#[derive(Debug)]
pub struct DeliveryPool {
    sender: mpsc::Sender<RelayEntry>,
    in_flight: Arc<Mutex<HashSet<MessageId>>>,
    workers: Vec<JoinHandle<()>>,
}

impl DeliveryPool {
    /// Spawns `workers` tasks sharing `worker` and a channel of `capacity` entries.
    pub fn spawn<D>(
        worker: RelayWorker<D>,
        workers: usize,
        capacity: usize,
        cancel: CancellationToken,
    ) -> Self
    where
        D: RelayerDb + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let in_flight = Arc::new(Mutex::new(HashSet::new()));
        let worker = Arc::new(worker);

        let workers = (0..workers.max(1))
            .map(|index| {
                let receiver = receiver.clone();
                let in_flight = in_flight.clone();
                let worker = worker.clone();
                let cancel = cancel.clone();

                tokio::spawn(async move {
                    loop {
                        let next = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => None,
                            entry = async { receiver.lock().await.recv().await } => entry,
                        };
                        let Some(entry) = next else {
                            break;
                        };

                        if let Some(status) = worker.relay(&entry, &cancel).await {
                            info!(id = %entry.id, %status, "relay finished");
                        }
                        in_flight.lock().await.remove(&entry.id);
                    }

                    debug!(%index, "delivery worker exiting");
                })
            })
            .collect();

        Self {
            sender,
            in_flight,
            workers,
        }
    }

    /// Hands pending entries to the workers without waiting for room.
    ///
    /// Entries already in flight are skipped. Returns the number of entries accepted.
    pub async fn offer(&self, entries: Vec<RelayEntry>) -> usize {
        let mut in_flight = self.in_flight.lock().await;
        let mut accepted = 0;

        for entry in entries {
            if entry.status != RelayStatus::Pending || !in_flight.insert(entry.id) {
                continue;
            }

            let id = entry.id;
            if let Err(err) = self.sender.try_send(entry) {
                in_flight.remove(&id);
                match err {
                    mpsc::error::TrySendError::Full(_) => {
                        debug!(%id, "delivery queue full, leaving the rest pending");
                    }
                    mpsc::error::TrySendError::Closed(_) => {
                        warn!(%id, "delivery workers stopped");
                    }
                }
                break;
            }

            accepted += 1;
        }

        accepted
    }

    /// Number of messages queued or being relayed.
    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    /// Waits for every worker to exit. Workers exit once the pool's cancellation token fires.
    pub async fn join(self) {
        drop(self.sender);
        for worker in self.workers {
            if let Err(err) = worker.await {
                error!(%err, "delivery worker panicked");
            }
        }
    }
}
