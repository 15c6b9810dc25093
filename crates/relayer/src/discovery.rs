//! Discovery of messages published by the configured emitter.
//!
//! Each poll scans the source ledger from the block after the persisted cursor, at most
//! `max_scan_blocks` blocks toward the current head. It queues every `CredentialIssued` sequence
//! of the emitter as pending and only then moves the cursor to the end of the window. A crash
//! between the two steps rescans blocks whose messages are already queued, which the queue
//! absorbs, so no message is ever skipped. A relayer far behind the head catches up over several
//! polls, which the subscription runs back to back.

use std::{sync::Arc, time::Duration};

use credmirror_db::relay::RelayerDb;
use credmirror_primitives::types::EmitterKey;
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::DEFAULT_MAX_SCAN_BLOCKS, errors::DiscoveryError, subscription::Subscription,
    traits::SourceChain,
};

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Blocks scanned, if the chain advanced.
    pub scanned: Option<(u64, u64)>,

    /// Messages found in the scanned blocks.
    pub discovered: usize,

    /// Of those, messages not queued before.
    pub queued: usize,

    /// The cursor after the poll.
    pub cursor: u64,

    /// The source head seen by the poll.
    pub head: u64,
}

impl PollOutcome {
    /// Whether the cursor reached the head seen by the poll.
    pub const fn caught_up(&self) -> bool {
        self.cursor >= self.head
    }
}

/// Pull-based discovery for one emitter.
#[derive(Debug)]
pub struct Discovery<D> {
    source: Arc<dyn SourceChain>,
    db: Arc<D>,
    emitter: EmitterKey,
    start_height: Option<u64>,
    max_scan_blocks: u64,
}

impl<D> Clone for Discovery<D> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            db: self.db.clone(),
            emitter: self.emitter,
            start_height: self.start_height,
            max_scan_blocks: self.max_scan_blocks,
        }
    }
}

impl<D> Discovery<D>
where
    D: RelayerDb + Send + Sync + 'static,
{
    /// Creates discovery for `emitter`.
    ///
    /// `start_height` is the first block scanned when no cursor is persisted yet; without it a
    /// fresh relayer starts at the current head.
    pub fn new(
        source: Arc<dyn SourceChain>,
        db: Arc<D>,
        emitter: EmitterKey,
        start_height: Option<u64>,
    ) -> Self {
        Self {
            source,
            db,
            emitter,
            start_height,
            max_scan_blocks: DEFAULT_MAX_SCAN_BLOCKS,
        }
    }

    /// Limits each poll to `blocks` source blocks (at least one).
    pub fn with_max_scan_blocks(mut self, blocks: u64) -> Self {
        self.max_scan_blocks = blocks.max(1);
        self
    }

    /// The emitter being watched.
    pub const fn emitter(&self) -> EmitterKey {
        self.emitter
    }

    /// Scans new blocks once.
    pub async fn poll(&self) -> Result<PollOutcome, DiscoveryError> {
        let head = self.source.chain_head().await?;
        if head.chain_id != self.emitter.chain_id {
            return Err(DiscoveryError::WrongChain {
                expected: self.emitter.chain_id,
                actual: head.chain_id,
            });
        }

        let cursor = match self.db.get_scan_cursor(self.emitter).await? {
            Some(cursor) => cursor,
            None => {
                let cursor = match self.start_height {
                    Some(start) => start.saturating_sub(1),
                    None => head.height,
                };
                info!(emitter = %self.emitter, %cursor, "no persisted cursor, starting fresh");
                self.db.set_scan_cursor(self.emitter, cursor).await?;
                cursor
            }
        };

        if head.height <= cursor {
            if head.height < cursor {
                warn!(head = head.height, %cursor, "source head is behind the cursor");
            }

            return Ok(PollOutcome {
                scanned: None,
                discovered: 0,
                queued: 0,
                cursor,
                head: head.height,
            });
        }

        let from = cursor + 1;
        let to = head
            .height
            .min(cursor.saturating_add(self.max_scan_blocks));
        let events = self.source.issuance_events(from, to).await?;

        let mut discovered = 0;
        let mut queued = 0;
        for event in events
            .iter()
            .filter(|event| event.emitter == self.emitter.address)
        {
            discovered += 1;
            let id = self.emitter.message(event.sequence);
            if self.db.enqueue_message(id, event.block_height).await? {
                queued += 1;
                debug!(%id, block_height = event.block_height, "queued message");
            }
        }

        self.db.set_scan_cursor(self.emitter, to).await?;
        debug!(%from, %to, %discovered, %queued, "scanned source blocks");

        Ok(PollOutcome {
            scanned: Some((from, to)),
            discovered,
            queued,
            cursor: to,
            head: head.height,
        })
    }

    /// Polls every `interval` on a background task and streams the outcomes.
    ///
    /// The first poll runs immediately. While a poll leaves the cursor behind the head, the next
    /// one follows without waiting for the interval. The stream ends after the first failed
    /// poll, or once `cancel` fires or the subscription is dropped.
    pub fn subscribe(
        self,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Subscription<Result<PollOutcome, DiscoveryError>> {
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut behind = false;

            loop {
                if behind {
                    if cancel.is_cancelled() {
                        break;
                    }
                } else {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {}
                    }
                }

                let outcome = self.poll().await;
                let failed = outcome.is_err();
                behind = matches!(&outcome, Ok(outcome) if !outcome.caught_up());
                if sender.send(outcome).is_err() || failed {
                    break;
                }
            }

            debug!(emitter = %self.emitter, "discovery task exiting");
        });

        Subscription::from_receiver(receiver)
    }
}

#[cfg(test)]
mod tests {
    use credmirror_db::inmemory::relay::RelayerInMemory;
    use credmirror_programs::emitter::SourceCalls;
    use futures::StreamExt;

    use super::*;
    use crate::test_utils::{content_hash, Fixture, EMITTER, SOURCE_CHAIN};

    fn discovery(fixture: &Fixture, start_height: Option<u64>) -> Discovery<RelayerInMemory> {
        Discovery::new(
            fixture.source_chain(),
            Arc::new(RelayerInMemory::default()),
            EmitterKey::new(SOURCE_CHAIN, EMITTER),
            start_height,
        )
    }

    #[tokio::test]
    async fn fresh_cursor_starts_at_head() {
        let fixture = Fixture::new();
        fixture.issue("QmOld", content_hash(1)).await;

        let discovery = discovery(&fixture, None);
        let first = discovery.poll().await.unwrap();
        assert_eq!((first.scanned, first.cursor), (None, 1));

        fixture.issue("QmNew", content_hash(2)).await;
        let second = discovery.poll().await.unwrap();
        assert_eq!(second.scanned, Some((2, 2)));
        assert_eq!(second.queued, 1);

        let pending = discovery
            .db
            .pending_messages(discovery.emitter(), 10)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id.sequence, 1);
    }

    #[tokio::test]
    async fn start_height_scans_history() {
        let fixture = Fixture::new();
        fixture.issue("QmA", content_hash(1)).await;
        fixture.issue("QmB", content_hash(2)).await;

        let outcome = discovery(&fixture, Some(1)).poll().await.unwrap();
        assert_eq!(outcome.scanned, Some((1, 2)));
        assert_eq!((outcome.discovered, outcome.queued), (2, 2));
    }

    #[tokio::test]
    async fn cursor_advances_without_events() {
        let fixture = Fixture::new();
        let discovery = discovery(&fixture, Some(1));

        fixture
            .source
            .lock()
            .await
            .set_mirror_target(crate::test_utils::ADMIN, EMITTER)
            .unwrap();

        let outcome = discovery.poll().await.unwrap();
        assert_eq!((outcome.discovered, outcome.cursor), (0, 1));
        assert_eq!(
            discovery.db.get_scan_cursor(discovery.emitter()).await.unwrap(),
            Some(1)
        );
    }

    #[tokio::test]
    async fn rescanning_is_idempotent() {
        let fixture = Fixture::new();
        fixture.issue("QmA", content_hash(1)).await;

        let discovery = discovery(&fixture, Some(1));
        discovery.poll().await.unwrap();

        // simulate a crash after queueing but before the cursor moved
        discovery
            .db
            .set_scan_cursor(discovery.emitter(), 0)
            .await
            .unwrap();
        let outcome = discovery.poll().await.unwrap();
        assert_eq!((outcome.discovered, outcome.queued), (1, 0));
    }

    #[tokio::test]
    async fn long_backlog_is_scanned_in_windows() {
        let fixture = Fixture::new();
        for i in 0..5u8 {
            fixture.issue(&format!("Qm{i}"), content_hash(i + 1)).await;
        }

        let discovery = discovery(&fixture, Some(1)).with_max_scan_blocks(2);

        let first = discovery.poll().await.unwrap();
        assert_eq!(first.scanned, Some((1, 2)));
        assert_eq!((first.queued, first.head), (2, 5));
        assert!(!first.caught_up());
        assert_eq!(
            discovery.db.get_scan_cursor(discovery.emitter()).await.unwrap(),
            Some(2)
        );

        let second = discovery.poll().await.unwrap();
        assert_eq!((second.scanned, second.queued), (Some((3, 4)), 2));

        let third = discovery.poll().await.unwrap();
        assert_eq!((third.scanned, third.queued), (Some((5, 5)), 1));
        assert!(third.caught_up());

        let pending = discovery
            .db
            .pending_messages(discovery.emitter(), 10)
            .await
            .unwrap();
        assert_eq!(pending.len(), 5);
    }

    #[tokio::test]
    async fn foreign_chain_is_refused() {
        let fixture = Fixture::new();
        let discovery = Discovery::new(
            fixture.source_chain(),
            Arc::new(RelayerInMemory::default()),
            EmitterKey::new(credmirror_primitives::types::ChainId(9), EMITTER),
            None,
        );

        assert!(matches!(
            discovery.poll().await,
            Err(DiscoveryError::WrongChain { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_streams_polls() {
        let fixture = Fixture::new();
        let cancel = CancellationToken::new();
        let mut polls = discovery(&fixture, Some(1)).subscribe(Duration::from_secs(5), cancel.clone());

        assert_eq!(polls.next().await.unwrap().unwrap().cursor, 0);

        fixture.issue("QmA", content_hash(1)).await;
        let outcome = polls.next().await.unwrap().unwrap();
        assert_eq!(outcome.queued, 1);

        cancel.cancel();
        assert!(polls.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_catches_up_without_waiting() {
        let fixture = Fixture::new();
        for i in 0..3u8 {
            fixture.issue(&format!("Qm{i}"), content_hash(i + 1)).await;
        }

        let cancel = CancellationToken::new();
        let started = time::Instant::now();
        let mut polls = discovery(&fixture, Some(1))
            .with_max_scan_blocks(1)
            .subscribe(Duration::from_secs(60), cancel.clone());

        let mut cursors = Vec::new();
        for _ in 0..3 {
            cursors.push(polls.next().await.unwrap().unwrap().cursor);
        }
        assert_eq!(cursors, vec![1, 2, 3]);
        assert!(started.elapsed() < Duration::from_secs(60));

        cancel.cancel();
        assert!(polls.next().await.is_none());
    }
}
