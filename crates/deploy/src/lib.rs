//! relayer-deploy - Deployment library for the GasRelayer contract.
//!
//! This crate deploys the relayer to EVM chains through the CreateX CREATE3 factory,
//! keeps a per-chain record of the deployed addresses, and registers every
//! deployment as a LayerZero peer of the home chain's relayer.

mod artifact;
pub use artifact::{ArtifactSource, ContractArtifact};

mod chain;
pub use chain::{AlloyChain, ICreateX, IGasRelayer, RelayerChain};

mod deployer;
pub use deployer::{DeploymentReport, PeerLink, RelayerDeployer};

mod error;
pub use error::{DeployError, Result};

pub mod network;
pub use network::{
    CREATEX_ADDRESS, DEFAULT_HOME_CHAIN_ID, Network, chain_id_for, messaging_eid_for,
    messaging_endpoint_for,
};

mod salt;
pub use salt::Create3Salt;

mod settings;
pub use settings::{DeploymentPaths, SETTINGS_FILENAME, Settings};

mod store;
pub use store::{DeploymentStore, Deployments};
