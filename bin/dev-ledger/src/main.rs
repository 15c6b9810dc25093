//! A devnet node hosting the source ledger, the destination ledger and a guardian network in one
//! process.
//!
//! Callers identify themselves in every request and the node takes them at their word. It exists
//! to run relayers against, not to secure anything.

use std::path::PathBuf;

use anyhow::Context;
use clap::{crate_version, Parser};
use config::Config;
use credmirror_common::{
    logging::{self, LoggerConfig},
    toml_file,
};
use node::DevNode;
use tokio::runtime;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod config;
mod node;
mod rest;
mod rpc_server;

#[cfg(test)]
mod test_utils;

#[derive(Debug, Parser)]
#[clap(
    name = "dev-ledger",
    about = "Local ledgers and guardian network for credmirror development",
    version = crate_version!()
)]
struct Cli {
    #[clap(
        long,
        short = 'c',
        help = "The file containing the configuration for the node",
        default_value = "config.toml"
    )]
    config: PathBuf,
}

fn main() {
    if let Err(err) = try_main() {
        error!(?err, "dev ledger failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }

    info!("dev ledger shutdown complete");
}

fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(LoggerConfig::from_env("dev-ledger"))?;

    let config: Config = toml_file::load(&cli.config)?;

    runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("create runtime")?
        .block_on(run(config))
}

async fn run(config: Config) -> anyhow::Result<()> {
    let node = DevNode::from_config(&config)?;
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

    let rpc = rpc_server::start_rpc(node.clone(), &config.rpc_addr, cancel.clone());
    match &config.rest_addr {
        Some(rest_addr) => {
            let rest = rest::start_rest(node, rest_addr, cancel.clone());
            let (rpc, rest) = tokio::join!(rpc, rest);
            rpc.and(rest)
        }
        None => rpc.await,
    }
}
