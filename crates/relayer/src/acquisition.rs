//! Waiting for a message's attestation.
//!
//! Attestations appear an unbounded time after publication. Lookups repeat at a fixed interval
//! until one succeeds or the attempt budget runs out. Service failures count against the same
//! budget as "not available yet".

use std::{sync::Arc, time::Duration};

use credmirror_common::retry::{retry_with, Strategy};
use credmirror_primitives::types::MessageId;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{errors::AcquisitionError, traits::AttestationSource};

/// An attestation together with the lookups it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    /// The attestation bytes.
    pub attestation: Vec<u8>,

    /// Lookups made, including the successful one.
    pub attempts: u32,
}

/// Bounded, fixed-interval attestation lookups.
#[derive(Debug, Clone)]
pub struct Acquisition {
    source: Arc<dyn AttestationSource>,
    retry_interval: Duration,
    max_attempts: u32,
}

impl Acquisition {
    /// Creates an acquisition stage making at most `max_attempts` lookups per message.
    pub fn new(source: Arc<dyn AttestationSource>, retry_interval: Duration, max_attempts: u32) -> Self {
        Self {
            source,
            retry_interval,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Looks `id` up until its attestation is available.
    ///
    /// Returns [`AcquisitionError::Exhausted`] once the budget is spent and
    /// [`AcquisitionError::Cancelled`] if `cancel` fires first.
    pub async fn acquire(
        &self,
        id: MessageId,
        cancel: &CancellationToken,
    ) -> Result<Acquired, AcquisitionError> {
        let strategy =
            Strategy::fixed_delay(self.retry_interval).with_max_retries(self.max_attempts as usize - 1);
        let mut attempts = 0u32;

        let lookups = retry_with(strategy, || {
            attempts += 1;
            let attempt = attempts;
            let source = self.source.clone();

            async move {
                match source.fetch(id).await {
                    Ok(Some(attestation)) => Ok(attestation),
                    Ok(None) => {
                        debug!(%id, %attempt, "attestation not available yet");
                        Err(AcquisitionError::NotAvailable)
                    }
                    Err(err) => {
                        warn!(%id, %attempt, %err, "attestation lookup failed");
                        Err(AcquisitionError::Fetch(err))
                    }
                }
            }
        });

        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(AcquisitionError::Cancelled),
            result = lookups => result,
        };

        match result {
            Ok(attestation) => Ok(Acquired {
                attestation,
                attempts,
            }),
            Err(last) => Err(AcquisitionError::Exhausted {
                attempts,
                last: Box::new(last),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use credmirror_primitives::{buf::Address, types::ChainId};

    use super::*;
    use crate::errors::FetchError;

    /// Serves nothing for `empty` lookups, fails the next `failing`, then serves `[seq]`.
    #[derive(Debug, Default)]
    struct Scripted {
        empty: u32,
        failing: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl AttestationSource for Scripted {
        async fn fetch(&self, id: MessageId) -> Result<Option<Vec<u8>>, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.empty {
                Ok(None)
            } else if call < self.empty + self.failing {
                Err(FetchError::Unavailable("connection refused".into()))
            } else {
                Ok(Some(vec![id.sequence as u8]))
            }
        }
    }

    fn id() -> MessageId {
        MessageId {
            chain_id: ChainId(1),
            emitter: Address::new([1; 32]),
            sequence: 9,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_available() {
        let source = Arc::new(Scripted {
            empty: 2,
            failing: 1,
            ..Default::default()
        });
        let acquisition = Acquisition::new(source, Duration::from_secs(30), 5);

        let start = tokio::time::Instant::now();
        let acquired = acquisition
            .acquire(id(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(acquired.attestation, vec![9]);
        assert_eq!(acquired.attempts, 4);
        assert!(start.elapsed() >= Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_budget() {
        let source = Arc::new(Scripted {
            empty: u32::MAX,
            ..Default::default()
        });
        let acquisition = Acquisition::new(source.clone(), Duration::from_secs(30), 3);

        let err = acquisition
            .acquire(id(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AcquisitionError::Exhausted { attempts: 3, ref last } if matches!(**last, AcquisitionError::NotAvailable)
        ));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_waiting() {
        let source = Arc::new(Scripted {
            empty: u32::MAX,
            ..Default::default()
        });
        let acquisition = Acquisition::new(source, Duration::from_secs(30), 100);
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(45)).await;
                cancel.cancel();
            }
        };

        let (result, ()) = tokio::join!(acquisition.acquire(id(), &cancel), canceller);
        assert!(matches!(result, Err(AcquisitionError::Cancelled)));
    }
}
