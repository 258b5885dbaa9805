//! Error taxonomy for the relayer deployment workflow.
//!
//! Every variant is fatal: the binary logs it and exits with a non-zero status.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = DeployError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DeployError {
    /// Process configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The network name does not match any known network.
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// The chain has no messaging endpoint configured.
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(u64),

    /// The RPC endpoint is unreachable or the signing key is malformed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The factory call reverted, was underfunded, or the RPC failed mid-flight.
    #[error("Deployment failed on chain {chain_id}: {reason}")]
    DeploymentFailed { chain_id: u64, reason: String },

    /// The `set_peer` transaction could not be sent or reverted.
    #[error("Peer registration failed on chain {chain_id}: {reason}")]
    PeerRegistrationFailed { chain_id: u64, reason: String },

    /// No address is recorded for the chain.
    #[error("No relayer deployment recorded for chain {0}")]
    NotDeployed(u64),

    /// The contract could not be compiled or its artifact could not be read.
    #[error("Contract artifact error: {0}")]
    Artifact(String),

    /// Reading or writing a deployment file failed.
    #[error("Failed to access {path}: {reason}")]
    Store { path: PathBuf, reason: String },
}

impl DeployError {
    pub(crate) fn store(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Store {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
