//! Submitting attestations and classifying the verifier's verdict.

use std::sync::Arc;

use credmirror_db::relay::RelayStatus;
use credmirror_primitives::types::MessageId;
use credmirror_programs::{
    errors::ErrorClass,
    verifier::MirroredRecord,
};
use tracing::{error, info};

use crate::{errors::SubmitError, traits::DestinationChain};

/// Submits attestations to the destination ledger.
#[derive(Debug, Clone)]
pub struct Delivery {
    destination: Arc<dyn DestinationChain>,
}

impl Delivery {
    /// Creates a delivery stage submitting to `destination`.
    pub fn new(destination: Arc<dyn DestinationChain>) -> Self {
        Self { destination }
    }

    /// Submits the attestation of `id` and returns the resulting relay status.
    ///
    /// Never returns [`RelayStatus::Pending`].
    pub async fn deliver(&self, id: MessageId, attestation: Vec<u8>) -> RelayStatus {
        let result = self.destination.submit(attestation).await;
        classify(id, result)
    }
}

/// Maps the outcome of a submission to a relay status.
///
/// Idempotence failures mean the mirrored fact already exists: a replay rejection says another
/// submission consumed this attestation, and a duplicate-record rejection says a different
/// attestation of the same credential got there first. Either way the message counts as
/// delivered.
pub fn classify(id: MessageId, result: Result<MirroredRecord, SubmitError>) -> RelayStatus {
    match result {
        Ok(record) => {
            info!(%id, content_id_hash = %record.content_id_hash, issuer = %record.issuer, "credential mirrored");
            RelayStatus::Delivered
        }
        Err(SubmitError::Program { kind, .. }) if kind.class() == ErrorClass::Idempotence => {
            info!(%id, ?kind, "credential already mirrored by another submission");
            RelayStatus::AlreadyDelivered
        }
        Err(err) => {
            if err.kind().map(|kind| kind.class()) == Some(ErrorClass::Provenance) {
                error!(%id, %err, "destination refused attestation provenance, check emitter and guardian set configuration");
            } else {
                error!(%id, %err, "attestation submission failed");
            }

            RelayStatus::Rejected {
                reason: err.to_string(),
            }
        }
    }
}
