//! Relayer persistence: the discovery cursor and the durable relay queue.

use std::fmt;

use async_trait::async_trait;
use credmirror_primitives::types::{EmitterKey, MessageId};
use serde::{Deserialize, Serialize};

use crate::errors::DbResult;

/// Where a discovered message stands in the relay pipeline.
///
/// [`RelayStatus::Pending`] is the only non-terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RelayStatus {
    /// Discovered and not yet delivered.
    Pending,

    /// This relayer's submission created the mirrored record.
    Delivered,

    /// Another submission consumed the attestation first.
    AlreadyDelivered,

    /// The destination rejected the attestation.
    Rejected {
        /// Why the submission failed.
        reason: String,
    },

    /// The attestation never became available.
    Abandoned {
        /// Acquisition attempts made before giving up.
        attempts: u32,
    },
}

impl RelayStatus {
    /// Short name of the status, as stored in the database.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
            Self::AlreadyDelivered => "already_delivered",
            Self::Rejected { .. } => "rejected",
            Self::Abandoned { .. } => "abandoned",
        }
    }

    /// Whether the message reached the destination, by this relayer or another.
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered | Self::AlreadyDelivered)
    }

    /// Whether an operator may move the entry back to [`RelayStatus::Pending`].
    pub const fn is_requeueable(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Abandoned { .. })
    }
}

impl fmt::Display for RelayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { reason } => write!(f, "rejected ({reason})"),
            Self::Abandoned { attempts } => write!(f, "abandoned after {attempts} attempts"),
            other => f.write_str(other.label()),
        }
    }
}

/// An entry of the relay queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEntry {
    /// The message.
    pub id: MessageId,

    /// Source block height the message was discovered at.
    pub block_height: u64,

    /// Current status.
    pub status: RelayStatus,

    /// Attestation acquisition attempts recorded for the last completed relay.
    pub attempts: u32,
}

/// Number of relay queue entries per status for one emitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayCounts {
    /// Entries waiting for delivery.
    pub pending: u64,

    /// Entries delivered by this relayer.
    pub delivered: u64,

    /// Entries delivered by someone else.
    pub already_delivered: u64,

    /// Entries the destination rejected.
    pub rejected: u64,

    /// Entries whose attestation never became available.
    pub abandoned: u64,
}

impl RelayCounts {
    pub(crate) fn bump(&mut self, label: &str, by: u64) {
        match label {
            "pending" => self.pending += by,
            "delivered" => self.delivered += by,
            "already_delivered" => self.already_delivered += by,
            "rejected" => self.rejected += by,
            "abandoned" => self.abandoned += by,
            _ => {}
        }
    }
}

/// Storage used by the relayer.
#[async_trait]
pub trait RelayerDb {
    /// Returns the last source block height fully scanned for `emitter`, if any.
    async fn get_scan_cursor(&self, emitter: EmitterKey) -> DbResult<Option<u64>>;

    /// Persists the last source block height fully scanned for `emitter`.
    async fn set_scan_cursor(&self, emitter: EmitterKey, block_height: u64) -> DbResult<()>;

    /// Adds a discovered message as [`RelayStatus::Pending`].
    ///
    /// Returns `false` if the message was already queued, in which case its entry is left as is.
    async fn enqueue_message(&self, id: MessageId, block_height: u64) -> DbResult<bool>;

    /// Returns up to `limit` pending entries of `emitter`, lowest sequence first.
    async fn pending_messages(&self, emitter: EmitterKey, limit: usize)
        -> DbResult<Vec<RelayEntry>>;

    /// Records the outcome of relaying a message.
    async fn update_relay_status(
        &self,
        id: MessageId,
        status: RelayStatus,
        attempts: u32,
    ) -> DbResult<()>;

    /// Returns the entry of a message, if queued.
    async fn relay_entry(&self, id: MessageId) -> DbResult<Option<RelayEntry>>;

    /// Moves a rejected or abandoned entry back to [`RelayStatus::Pending`].
    ///
    /// Returns `false` if the entry does not exist or is in any other status.
    async fn requeue(&self, id: MessageId) -> DbResult<bool>;

    /// Counts the entries of `emitter` per status.
    async fn relay_counts(&self, emitter: EmitterKey) -> DbResult<RelayCounts>;
}
