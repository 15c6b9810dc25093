//! Row models of the relayer tables and their conversion to domain types.

use credmirror_primitives::{
    buf::Address,
    types::{ChainId, MessageId},
};

use super::errors::StorageError;
use crate::relay::{RelayEntry, RelayStatus};

/// A row of `relay_queue`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(super) struct RelayRow {
    /// Source chain id stored as `INTEGER`.
    pub(super) source_chain: i64,

    /// Hex-encoded emitter address stored as `TEXT`.
    pub(super) emitter: String,

    pub(super) sequence: i64,

    pub(super) block_height: i64,

    /// One of [`RelayStatus::label`].
    pub(super) status: String,

    /// Rejection reason, if any.
    pub(super) detail: Option<String>,

    pub(super) attempts: i64,
}

/// Converts a height or sequence to its `INTEGER` column value.
pub(super) fn integer_column(field: &str, value: u64) -> Result<i64, StorageError> {
    i64::try_from(value)
        .map_err(|_| StorageError::MismatchedTypes(format!("{field} {value} does not fit a column")))
}

/// Reads a height or sequence back from its `INTEGER` column value.
pub(super) fn integer_value(field: &str, value: i64) -> Result<u64, StorageError> {
    u64::try_from(value).map_err(|_| StorageError::MismatchedTypes(format!("{field} {value}")))
}

/// The `(status, detail)` columns of a status.
pub(super) fn status_columns(status: &RelayStatus) -> (&'static str, Option<String>) {
    let detail = match status {
        RelayStatus::Rejected { reason } => Some(reason.clone()),
        _ => None,
    };

    (status.label(), detail)
}

fn parse_status(status: &str, detail: Option<String>, attempts: u32) -> Result<RelayStatus, StorageError> {
    Ok(match status {
        "pending" => RelayStatus::Pending,
        "delivered" => RelayStatus::Delivered,
        "already_delivered" => RelayStatus::AlreadyDelivered,
        "rejected" => RelayStatus::Rejected {
            reason: detail.unwrap_or_default(),
        },
        "abandoned" => RelayStatus::Abandoned { attempts },
        other => {
            return Err(StorageError::MismatchedTypes(format!(
                "unknown relay status {other}"
            )))
        }
    })
}

impl TryFrom<RelayRow> for RelayEntry {
    type Error = StorageError;

    fn try_from(row: RelayRow) -> Result<Self, Self::Error> {
        let chain = u16::try_from(row.source_chain)
            .map_err(|_| StorageError::MismatchedTypes(format!("chain id {}", row.source_chain)))?;
        let emitter: Address = row
            .emitter
            .parse()
            .map_err(|err| StorageError::MismatchedTypes(format!("emitter: {err}")))?;
        let attempts = u32::try_from(row.attempts)
            .map_err(|_| StorageError::MismatchedTypes(format!("attempts {}", row.attempts)))?;

        Ok(RelayEntry {
            id: MessageId {
                chain_id: ChainId(chain),
                emitter,
                sequence: integer_value("sequence", row.sequence)?,
            },
            block_height: integer_value("block height", row.block_height)?,
            status: parse_status(&row.status, row.detail, attempts)?,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, detail: Option<&str>) -> RelayRow {
        RelayRow {
            source_chain: 1,
            emitter: Address::new([0xab; 32]).to_string(),
            sequence: 3,
            block_height: 7,
            status: status.to_string(),
            detail: detail.map(str::to_string),
            attempts: 4,
        }
    }

    #[test]
    fn rows_convert_to_entries() {
        let entry = RelayEntry::try_from(row("rejected", Some("untrusted emitter"))).unwrap();

        assert_eq!((entry.id.sequence, entry.block_height), (3, 7));
        assert_eq!(
            entry.status,
            RelayStatus::Rejected {
                reason: "untrusted emitter".to_string()
            }
        );
        assert_eq!(
            RelayEntry::try_from(row("abandoned", None)).unwrap().status,
            RelayStatus::Abandoned { attempts: 4 }
        );
    }

    #[test]
    fn unknown_status_is_a_type_mismatch() {
        assert!(matches!(
            RelayEntry::try_from(row("lost", None)),
            Err(StorageError::MismatchedTypes(_))
        ));
    }

    #[test]
    fn out_of_range_integers_are_refused() {
        let row = RelayRow {
            sequence: -1,
            ..row("pending", None)
        };
        assert!(matches!(
            RelayEntry::try_from(row),
            Err(StorageError::MismatchedTypes(_))
        ));

        assert_eq!(integer_column("sequence", 42).unwrap(), 42);
        assert!(matches!(
            integer_column("sequence", u64::MAX),
            Err(StorageError::MismatchedTypes(_))
        ));
        assert!(integer_value("block height", -5).is_err());
    }

    #[test]
    fn status_columns_carry_reason() {
        let (label, detail) = status_columns(&RelayStatus::Rejected {
            reason: "bad".into(),
        });
        assert_eq!((label, detail.as_deref()), ("rejected", Some("bad")));
        assert_eq!(status_columns(&RelayStatus::Pending), ("pending", None));
    }
}
