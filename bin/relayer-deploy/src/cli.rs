use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "relayer-deploy")]
#[command(
    author,
    version,
    about = "Deploy the GasRelayer to an EVM chain and register it as a peer of the home deployment"
)]
pub struct Cli {
    /// The verbosity level.
    ///
    /// Defaults to `debug` when the `DEBUG` setting is on, `info` otherwise.
    #[arg(short, long, global = true, env = "RELAYER_VERBOSITY")]
    pub verbosity: Option<LevelFilter>,

    /// Path to a Relayer.toml settings file.
    ///
    /// If not provided, ./Relayer.toml is used when present. Environment variables
    /// (WEB3_PK, WEB3_PROVIDER_URL, ...) always take precedence over the file.
    #[arg(long, alias = "conf", global = true, env = "RELAYER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Expected network name (e.g. `arbitrum-sepolia`).
    ///
    /// When set, the run aborts if the RPC endpoint serves a different chain.
    #[arg(short, long, global = true, env = "RELAYER_NETWORK")]
    pub network: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Deploy the relayer, record its address and register the home peer.
    Deploy,
    /// Register the home deployment as peer of this chain's recorded relayer.
    SetPeer,
}

impl Cli {
    pub fn verbosity(&self, debug: bool) -> LevelFilter {
        self.verbosity.unwrap_or(if debug {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
    }
}
