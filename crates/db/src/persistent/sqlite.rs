//! SQLite implementation of the relayer database.

use std::{future::Future, path::Path};

use async_trait::async_trait;
use credmirror_common::retry::{retry_with, RetryAction, Strategy};
use credmirror_primitives::types::{EmitterKey, MessageId};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Row, SqlitePool,
};
use tracing::{info, warn};

use super::{
    config::DbConfig,
    errors::StorageError,
    models::{integer_column, integer_value, status_columns, RelayRow},
};
use crate::{
    errors::{DbError, DbResult},
    relay::{RelayCounts, RelayEntry, RelayStatus, RelayerDb},
};

/// Runs a database operation, retrying transient failures as configured by `config`.
pub async fn execute_with_retries<F, Fut, T>(config: &DbConfig, operation: F) -> DbResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let backoff = config.backoff_period();
    let strategy = Strategy::new(move |err: &DbError, attempt| {
        if err.is_transient() {
            warn!(%err, %attempt, "transient database failure, retrying");
            RetryAction::Retry(backoff)
        } else {
            RetryAction::Stop
        }
    })
    .with_max_retries(config.max_retry_count());

    retry_with(strategy, operation).await
}

/// Relayer database backed by SQLite.
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pool: SqlitePool,
    config: DbConfig,
}

impl SqliteDb {
    /// Wraps a pool whose schema is already migrated.
    pub const fn new(pool: SqlitePool, config: DbConfig) -> Self {
        Self { pool, config }
    }

    /// Opens (creating if needed) the database file at `path` in WAL mode and applies the
    /// migrations.
    pub async fn open(path: impl AsRef<Path>, config: DbConfig) -> DbResult<Self> {
        let connect_options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_options)
            .await
            .map_err(StorageError::from)?;

        info!(path = %path.as_ref().display(), "running migrations");
        Self::migrate(&pool).await?;

        Ok(Self::new(pool, config))
    }

    /// Applies the embedded migrations to `pool`.
    pub async fn migrate(pool: &SqlitePool) -> DbResult<()> {
        sqlx::migrate!("../../migrations")
            .run(pool)
            .await
            .map_err(|err| StorageError::Driver(err.into()))?;

        Ok(())
    }

    /// Returns the underlying pool.
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn retrying<F, Fut, T>(&self, operation: F) -> DbResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = DbResult<T>> + Send,
        T: Send,
    {
        execute_with_retries(&self.config, operation).await
    }
}

fn driver(err: sqlx::Error) -> DbError {
    StorageError::Driver(err).into()
}

fn emitter_columns(emitter: &EmitterKey) -> (i64, String) {
    (i64::from(emitter.chain_id.0), emitter.address.to_string())
}

#[async_trait]
impl RelayerDb for SqliteDb {
    async fn get_scan_cursor(&self, emitter: EmitterKey) -> DbResult<Option<u64>> {
        let (chain, address) = emitter_columns(&emitter);

        self.retrying(|| async {
            let row = sqlx::query(
                "SELECT block_height FROM relayer_cursor WHERE source_chain = $1 AND emitter = $2",
            )
            .bind(chain)
            .bind(&address)
            .fetch_optional(&self.pool)
            .await
            .map_err(driver)?;

            let height = row
                .map(|row| row.try_get::<i64, _>("block_height"))
                .transpose()
                .map_err(driver)?;

            height
                .map(|height| integer_value("block height", height))
                .transpose()
                .map_err(DbError::from)
        })
        .await
    }

    async fn set_scan_cursor(&self, emitter: EmitterKey, block_height: u64) -> DbResult<()> {
        let (chain, address) = emitter_columns(&emitter);
        let block_height = integer_column("block height", block_height)?;

        self.retrying(|| async {
            let mut tx = self.pool.begin().await.map_err(driver)?;

            sqlx::query(
                "INSERT OR REPLACE INTO relayer_cursor
                    (source_chain, emitter, block_height)
                    VALUES ($1, $2, $3)",
            )
            .bind(chain)
            .bind(&address)
            .bind(block_height)
            .execute(&mut *tx)
            .await
            .map_err(driver)?;

            tx.commit().await.map_err(driver)?;

            Ok::<_, DbError>(())
        })
        .await
    }

    async fn enqueue_message(&self, id: MessageId, block_height: u64) -> DbResult<bool> {
        let (chain, address) = emitter_columns(&id.emitter_key());
        let sequence = integer_column("sequence", id.sequence)?;
        let block_height = integer_column("block height", block_height)?;

        self.retrying(|| async {
            let mut tx = self.pool.begin().await.map_err(driver)?;

            let result = sqlx::query(
                "INSERT OR IGNORE INTO relay_queue
                    (source_chain, emitter, sequence, block_height)
                    VALUES ($1, $2, $3, $4)",
            )
            .bind(chain)
            .bind(&address)
            .bind(sequence)
            .bind(block_height)
            .execute(&mut *tx)
            .await
            .map_err(driver)?;

            tx.commit().await.map_err(driver)?;

            Ok::<_, DbError>(result.rows_affected() == 1)
        })
        .await
    }

    async fn pending_messages(
        &self,
        emitter: EmitterKey,
        limit: usize,
    ) -> DbResult<Vec<RelayEntry>> {
        let (chain, address) = emitter_columns(&emitter);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = self
            .retrying(|| async {
                sqlx::query_as::<_, RelayRow>(
                    "SELECT source_chain, emitter, sequence, block_height, status, detail, attempts
                        FROM relay_queue
                        WHERE source_chain = $1 AND emitter = $2 AND status = 'pending'
                        ORDER BY sequence ASC
                        LIMIT $3",
                )
                .bind(chain)
                .bind(&address)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(driver)
            })
            .await?;

        rows.into_iter()
            .map(|row| RelayEntry::try_from(row).map_err(DbError::from))
            .collect()
    }

    async fn update_relay_status(
        &self,
        id: MessageId,
        status: RelayStatus,
        attempts: u32,
    ) -> DbResult<()> {
        let (chain, address) = emitter_columns(&id.emitter_key());
        let sequence = integer_column("sequence", id.sequence)?;
        let (label, detail) = status_columns(&status);

        self.retrying(|| async {
            let mut tx = self.pool.begin().await.map_err(driver)?;

            let result = sqlx::query(
                "UPDATE relay_queue
                    SET status = $1, detail = $2, attempts = $3,
                        updated_at = CAST(strftime('%s', 'now') AS INTEGER)
                    WHERE source_chain = $4 AND emitter = $5 AND sequence = $6",
            )
            .bind(label)
            .bind(&detail)
            .bind(i64::from(attempts))
            .bind(chain)
            .bind(&address)
            .bind(sequence)
            .execute(&mut *tx)
            .await
            .map_err(driver)?;

            if result.rows_affected() == 0 {
                return Err(StorageError::InvalidData(format!("no relay entry for {id}")).into());
            }

            tx.commit().await.map_err(driver)?;

            Ok::<_, DbError>(())
        })
        .await
    }

    async fn relay_entry(&self, id: MessageId) -> DbResult<Option<RelayEntry>> {
        let (chain, address) = emitter_columns(&id.emitter_key());
        let sequence = integer_column("sequence", id.sequence)?;

        let row = self
            .retrying(|| async {
                sqlx::query_as::<_, RelayRow>(
                    "SELECT source_chain, emitter, sequence, block_height, status, detail, attempts
                        FROM relay_queue
                        WHERE source_chain = $1 AND emitter = $2 AND sequence = $3",
                )
                .bind(chain)
                .bind(&address)
                .bind(sequence)
                .fetch_optional(&self.pool)
                .await
                .map_err(driver)
            })
            .await?;

        Ok(row.map(RelayEntry::try_from).transpose()?)
    }

    async fn requeue(&self, id: MessageId) -> DbResult<bool> {
        let (chain, address) = emitter_columns(&id.emitter_key());
        let sequence = integer_column("sequence", id.sequence)?;

        self.retrying(|| async {
            let mut tx = self.pool.begin().await.map_err(driver)?;

            let result = sqlx::query(
                "UPDATE relay_queue
                    SET status = 'pending', detail = NULL,
                        updated_at = CAST(strftime('%s', 'now') AS INTEGER)
                    WHERE source_chain = $1 AND emitter = $2 AND sequence = $3
                        AND status IN ('rejected', 'abandoned')",
            )
            .bind(chain)
            .bind(&address)
            .bind(sequence)
            .execute(&mut *tx)
            .await
            .map_err(driver)?;

            tx.commit().await.map_err(driver)?;

            Ok::<_, DbError>(result.rows_affected() == 1)
        })
        .await
    }

    async fn relay_counts(&self, emitter: EmitterKey) -> DbResult<RelayCounts> {
        let (chain, address) = emitter_columns(&emitter);

        let rows = self
            .retrying(|| async {
                sqlx::query(
                    "SELECT status, COUNT(*) AS n FROM relay_queue
                        WHERE source_chain = $1 AND emitter = $2
                        GROUP BY status",
                )
                .bind(chain)
                .bind(&address)
                .fetch_all(&self.pool)
                .await
                .map_err(driver)
            })
            .await?;

        let mut counts = RelayCounts::default();
        for row in rows {
            let status: String = row.try_get("status").map_err(driver)?;
            let n: i64 = row.try_get("n").map_err(driver)?;
            counts.bump(&status, n as u64);
        }

        Ok(counts)
    }
}
