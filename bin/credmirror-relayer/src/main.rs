//! The credmirror relayer mirrors issued credentials from the source ledger to the destination
//! ledger.

use anyhow::Context;
use args::{Cli, Command};
use clap::Parser;
use config::Config;
use credmirror_common::{
    logging::{self, LoggerConfig},
    toml_file,
};
use tokio::runtime;
use tracing::{error, info};

mod args;
mod bootstrap;
mod commands;
mod config;
mod constants;

fn main() {
    if let Err(err) = try_main() {
        error!(?err, "relayer failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }

    info!("relayer exited");
}

fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(LoggerConfig::from_env("credmirror-relayer"))?;

    let config: Config = toml_file::load(&cli.config)?;

    let runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("create runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Command::Run => bootstrap::run(config).await,
            Command::Status { sequence } => commands::status(&config, sequence).await,
            Command::Requeue { sequence } => commands::requeue(&config, sequence).await,
        }
    })
}
