//! In-memory implementation of the relayer database.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use credmirror_primitives::types::{EmitterKey, MessageId};
use tokio::sync::RwLock;

use super::errors::InMemoryError;
use crate::{
    errors::DbResult,
    relay::{RelayCounts, RelayEntry, RelayStatus, RelayerDb},
};

/// In-memory relayer database. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct RelayerInMemory {
    /// Last scanned block height per emitter.
    cursors: Arc<RwLock<BTreeMap<EmitterKey, u64>>>,

    /// Relay queue, ordered by message id.
    queue: Arc<RwLock<BTreeMap<MessageId, RelayEntry>>>,
}

#[async_trait]
impl RelayerDb for RelayerInMemory {
    async fn get_scan_cursor(&self, emitter: EmitterKey) -> DbResult<Option<u64>> {
        Ok(self.cursors.read().await.get(&emitter).copied())
    }

    async fn set_scan_cursor(&self, emitter: EmitterKey, block_height: u64) -> DbResult<()> {
        self.cursors.write().await.insert(emitter, block_height);

        Ok(())
    }

    async fn enqueue_message(&self, id: MessageId, block_height: u64) -> DbResult<bool> {
        let mut queue = self.queue.write().await;
        if queue.contains_key(&id) {
            return Ok(false);
        }

        queue.insert(
            id,
            RelayEntry {
                id,
                block_height,
                status: RelayStatus::Pending,
                attempts: 0,
            },
        );

        Ok(true)
    }

    async fn pending_messages(
        &self,
        emitter: EmitterKey,
        limit: usize,
    ) -> DbResult<Vec<RelayEntry>> {
        let queue = self.queue.read().await;

        Ok(queue
            .range(emitter.message(0)..=emitter.message(u64::MAX))
            .map(|(_, entry)| entry)
            .filter(|entry| entry.status == RelayStatus::Pending)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_relay_status(
        &self,
        id: MessageId,
        status: RelayStatus,
        attempts: u32,
    ) -> DbResult<()> {
        let mut queue = self.queue.write().await;
        let entry = queue.get_mut(&id).ok_or(InMemoryError::NotFound(id))?;

        entry.status = status;
        entry.attempts = attempts;

        Ok(())
    }

    async fn relay_entry(&self, id: MessageId) -> DbResult<Option<RelayEntry>> {
        Ok(self.queue.read().await.get(&id).cloned())
    }

    async fn requeue(&self, id: MessageId) -> DbResult<bool> {
        let mut queue = self.queue.write().await;

        match queue.get_mut(&id) {
            Some(entry) if entry.status.is_requeueable() => {
                entry.status = RelayStatus::Pending;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn relay_counts(&self, emitter: EmitterKey) -> DbResult<RelayCounts> {
        let queue = self.queue.read().await;

        let mut counts = RelayCounts::default();
        queue
            .range(emitter.message(0)..=emitter.message(u64::MAX))
            .for_each(|(_, entry)| counts.bump(entry.status.label(), 1));

        Ok(counts)
    }
}
