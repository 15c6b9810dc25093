//! Wires the relayer's clients and database from the configuration.

use std::sync::Arc;

use anyhow::Context;
use credmirror_db::persistent::{constants::DB_FILE_NAME, sqlite::SqliteDb};
use relayer::{
    clients::{
        rest::RestAttestationSource,
        rpc::{RpcAttestationSource, RpcDestinationChain, RpcSourceChain},
    },
    supervisor::Relayer,
    traits::AttestationSource,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{AttestationKind, Config};

/// Opens the relayer database inside the data directory.
pub(crate) async fn open_db(config: &Config) -> anyhow::Result<SqliteDb> {
    tokio::fs::create_dir_all(&config.datadir)
        .await
        .with_context(|| format!("create datadir {}", config.datadir.display()))?;

    let path = config.datadir.join(DB_FILE_NAME);
    SqliteDb::open(&path, config.db)
        .await
        .with_context(|| format!("open database {}", path.display()))
}

fn attestation_source(config: &Config) -> anyhow::Result<Arc<dyn AttestationSource>> {
    let attestation = &config.attestation;

    Ok(match attestation.kind {
        AttestationKind::Rest => Arc::new(
            RestAttestationSource::new(&attestation.url, attestation.request_timeout)
                .context("build attestation rest client")?,
        ),
        AttestationKind::Rpc => Arc::new(
            RpcAttestationSource::new(&attestation.url, attestation.request_timeout)
                .context("build attestation rpc client")?,
        ),
    })
}

/// Runs the relayer until ctrl-c.
pub(crate) async fn run(config: Config) -> anyhow::Result<()> {
    let db = Arc::new(open_db(&config).await?);

    let source = RpcSourceChain::new(&config.source.rpc_url, config.source.request_timeout)
        .context("build source rpc client")?;
    let destination = RpcDestinationChain::new(
        &config.destination.rpc_url,
        config.destination.submitter,
        config.destination.request_timeout,
    )
    .context("build destination rpc client")?;

    let emitter = config.source.emitter_key();
    let relayer = Relayer::new(
        config.relayer,
        emitter,
        Arc::new(source),
        attestation_source(&config)?,
        Arc::new(destination),
        db,
    );

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "could not listen for ctrl-c");
            return;
        }
        info!("received ctrl-c, shutting down");
        signal.cancel();
    });

    info!(%emitter, source = %config.source.rpc_url, destination = %config.destination.rpc_url, "starting relayer");
    relayer.run(cancel).await;

    Ok(())
}
