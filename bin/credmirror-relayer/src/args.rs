//! Parses command-line arguments for the relayer CLI.

use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(
    name = "credmirror-relayer",
    about = "Relays issued credentials from the source ledger to the destination ledger",
    version = crate_version!()
)]
pub(crate) struct Cli {
    #[clap(
        long,
        short = 'c',
        help = "The file containing the configuration for the relayer",
        default_value = "config.toml"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub(crate) enum Command {
    /// Discover and relay messages until interrupted.
    Run,

    /// Print the scan cursor and relay queue counts, or the entry of one message.
    Status {
        /// Sequence of the message to show.
        #[arg(long)]
        sequence: Option<u64>,
    },

    /// Move an abandoned or rejected message back to pending.
    Requeue {
        /// Sequence of the message to requeue.
        sequence: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_subcommands() {
        let cli = Cli::parse_from(["credmirror-relayer", "run"]);
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert!(matches!(cli.command, Command::Run));

        let cli = Cli::parse_from(["credmirror-relayer", "-c", "relayer.toml", "requeue", "7"]);
        assert_eq!(cli.config, PathBuf::from("relayer.toml"));
        assert!(matches!(cli.command, Command::Requeue { sequence: 7 }));

        let cli = Cli::parse_from(["credmirror-relayer", "status", "--sequence", "3"]);
        assert!(matches!(cli.command, Command::Status { sequence: Some(3) }));
    }
}
