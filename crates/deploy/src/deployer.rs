//! The deployment workflow: deploy the relayer on the connected chain, record it, and
//! peer it with the home chain's deployment.

use std::path::PathBuf;

use alloy::primitives::{Address, B256};

use crate::{
    artifact::ArtifactSource,
    chain::RelayerChain,
    error::{DeployError, Result},
    network::{
        DEFAULT_HOME_CHAIN_ID, RELAYER_GAS_LIMIT, messaging_eid_for, messaging_endpoint_for,
    },
    salt::Create3Salt,
    settings::Settings,
    store::DeploymentStore,
};

/// A `set_peer` call sent to a relayer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerLink {
    /// Relayer the peer was registered on.
    pub contract: Address,
    /// Endpoint ID of the home chain.
    pub eid: u32,
    /// Home chain relayer address.
    pub peer: Address,
    pub tx_hash: B256,
}

/// Outcome of [`RelayerDeployer::deploy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    pub chain_id: u64,
    pub address: Address,
    pub salt: Create3Salt,
    /// `None` on the home chain.
    pub peer: Option<PeerLink>,
}

/// Deploys the GasRelayer on one chain per run.
///
/// The chain connection is established by the caller (see
/// [`AlloyChain::connect`](crate::AlloyChain::connect)); everything after that is
/// strictly sequential and any failure aborts the run.
#[derive(Debug)]
pub struct RelayerDeployer<C> {
    chain: C,
    store: DeploymentStore,
    artifact: ArtifactSource,
    abi_path: PathBuf,
    home_chain_id: u64,
    gas_limit: u64,
}

impl<C: RelayerChain> RelayerDeployer<C> {
    pub fn new(
        chain: C,
        store: DeploymentStore,
        artifact: ArtifactSource,
        abi_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            chain,
            store,
            artifact,
            abi_path: abi_path.into(),
            home_chain_id: DEFAULT_HOME_CHAIN_ID,
            gas_limit: RELAYER_GAS_LIMIT,
        }
    }

    pub fn from_settings(chain: C, settings: &Settings) -> Self {
        Self::new(
            chain,
            settings.deployment_store(),
            settings.artifact_source(),
            settings.abi_path(),
        )
        .home_chain_id(settings.home_chain_id)
        .gas_limit(settings.gas_limit)
    }

    /// Set the chain every other deployment peers with.
    pub fn home_chain_id(mut self, home_chain_id: u64) -> Self {
        self.home_chain_id = home_chain_id;
        self
    }

    /// Set the gas limit passed to the relayer constructor.
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn store(&self) -> &DeploymentStore {
        &self.store
    }

    pub fn is_home_chain(&self) -> bool {
        self.chain.chain_id() == self.home_chain_id
    }

    /// Deploy the relayer, write its ABI, record its address, and, away from the home
    /// chain, register the home deployment as its peer.
    pub async fn deploy(&self) -> Result<DeploymentReport> {
        let chain_id = self.chain.chain_id();

        // Resolve the endpoint before anything touches the chain or the disk.
        let endpoint = messaging_endpoint_for(chain_id)?;

        let salt = Create3Salt::generate(self.chain.deployer());
        tracing::debug!(chain_id, salt = %salt, endpoint = %endpoint, "Derived deployment salt");

        let artifact = self.artifact.load().await?;
        let init_code = artifact.init_code(endpoint, self.gas_limit);

        tracing::info!(
            chain_id,
            init_code_len = init_code.len(),
            "Deploying gas relayer through CreateX..."
        );
        let address = self.chain.deploy_create3(salt, init_code).await?;
        tracing::info!(chain_id, address = %address, "Gas relayer deployed");

        artifact.write_abi(&self.abi_path)?;
        self.store.record(chain_id, address)?;

        let peer = if self.is_home_chain() {
            tracing::info!(chain_id, "Home chain deployment, skipping peer registration");
            None
        } else {
            Some(self.register_peer(address).await?)
        };

        Ok(DeploymentReport {
            chain_id,
            address,
            salt,
            peer,
        })
    }

    /// Register the home deployment as the peer of this chain's recorded relayer,
    /// without redeploying.
    pub async fn set_peer(&self) -> Result<PeerLink> {
        let chain_id = self.chain.chain_id();
        if self.is_home_chain() {
            return Err(DeployError::Config(format!(
                "chain {chain_id} is the home chain and has no peer to register"
            )));
        }

        let contract = self.store.get(chain_id)?;
        self.register_peer(contract).await
    }

    async fn register_peer(&self, contract: Address) -> Result<PeerLink> {
        let peer = self.store.get(self.home_chain_id)?;
        let eid = messaging_eid_for(self.home_chain_id)?;

        tracing::info!(
            chain_id = self.chain.chain_id(),
            contract = %contract,
            eid,
            peer = %peer,
            "Registering home deployment as peer..."
        );
        let tx_hash = self.chain.set_peer(contract, eid, peer).await?;
        tracing::info!(tx_hash = %tx_hash, "Peer registered");

        Ok(PeerLink {
            contract,
            eid,
            peer,
            tx_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alloy::primitives::{Bytes, address};
    use tempdir::TempDir;

    use super::*;

    const ARB_SEPOLIA: u64 = 421614;
    const SEPOLIA: u64 = 11155111;
    const DEPLOYER: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
    const DEPLOYED: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
    const HOME_RELAYER: Address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");

    #[derive(Debug, Default)]
    struct Calls {
        deploys: Vec<(Create3Salt, Bytes)>,
        peers: Vec<(Address, u32, Address)>,
    }

    #[derive(Debug)]
    struct MockChain {
        chain_id: u64,
        fail_deploy: bool,
        calls: Mutex<Calls>,
    }

    impl MockChain {
        fn new(chain_id: u64) -> Self {
            Self {
                chain_id,
                fail_deploy: false,
                calls: Mutex::default(),
            }
        }
    }

    impl RelayerChain for MockChain {
        fn chain_id(&self) -> u64 {
            self.chain_id
        }

        fn deployer(&self) -> Address {
            DEPLOYER
        }

        async fn deploy_create3(&self, salt: Create3Salt, init_code: Bytes) -> Result<Address> {
            if self.fail_deploy {
                return Err(DeployError::DeploymentFailed {
                    chain_id: self.chain_id,
                    reason: "insufficient funds".to_string(),
                });
            }
            self.calls.lock().unwrap().deploys.push((salt, init_code));
            Ok(DEPLOYED)
        }

        async fn set_peer(&self, contract: Address, eid: u32, peer: Address) -> Result<B256> {
            self.calls.lock().unwrap().peers.push((contract, eid, peer));
            Ok(B256::repeat_byte(0x11))
        }
    }

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new("relayer-deployer").unwrap();
            std::fs::write(
                dir.path().join("GasRelayer.json"),
                r#"{"abi": [], "bytecode": "0x6001600055"}"#,
            )
            .unwrap();
            Self { dir }
        }

        fn store(&self) -> DeploymentStore {
            DeploymentStore::new(
                self.dir.path().join("deployments.yaml"),
                self.dir.path().join("deployments.json"),
            )
        }

        fn abi_path(&self) -> PathBuf {
            self.dir.path().join("abi/gas_relayer.json")
        }

        fn deployer(&self, chain: MockChain) -> RelayerDeployer<MockChain> {
            RelayerDeployer::new(
                chain,
                self.store(),
                ArtifactSource::File(self.dir.path().join("GasRelayer.json")),
                self.abi_path(),
            )
        }
    }

    #[tokio::test]
    async fn test_home_chain_skips_peer_registration() {
        let fixture = Fixture::new();
        let deployer = fixture.deployer(MockChain::new(SEPOLIA));

        let report = deployer.deploy().await.unwrap();

        assert_eq!(report.chain_id, SEPOLIA);
        assert_eq!(report.address, DEPLOYED);
        assert_eq!(report.peer, None);
        assert!(deployer.chain().calls.lock().unwrap().peers.is_empty());
        assert_eq!(fixture.store().get(SEPOLIA).unwrap(), DEPLOYED);
    }

    #[tokio::test]
    async fn test_remote_chain_registers_home_peer() {
        let fixture = Fixture::new();
        fixture.store().record(SEPOLIA, HOME_RELAYER).unwrap();
        let deployer = fixture.deployer(MockChain::new(ARB_SEPOLIA));

        let report = deployer.deploy().await.unwrap();

        let link = report.peer.unwrap();
        assert_eq!(link.contract, DEPLOYED);
        assert_eq!(link.eid, 4294967294);
        assert_eq!(link.peer, HOME_RELAYER);

        let calls = deployer.chain().calls.lock().unwrap();
        assert_eq!(calls.peers, vec![(DEPLOYED, 4294967294, HOME_RELAYER)]);
    }

    #[tokio::test]
    async fn test_deploy_sends_guarded_salt_and_constructor_args() {
        let fixture = Fixture::new();
        let deployer = fixture.deployer(MockChain::new(SEPOLIA)).gas_limit(750_000);

        let report = deployer.deploy().await.unwrap();

        let calls = deployer.chain().calls.lock().unwrap();
        let (salt, init_code) = &calls.deploys[0];
        assert_eq!(*salt, report.salt);
        assert_eq!(salt.deployer(), DEPLOYER);
        assert_eq!(salt.flag(), 0x00);

        // 5 bytes of code + two 32-byte constructor words.
        assert_eq!(init_code.len(), 5 + 64);
        assert_eq!(&init_code[..5], &[0x60, 0x01, 0x60, 0x00, 0x55]);
        assert_eq!(
            &init_code[17..37],
            crate::network::LZ_TESTNET_ENDPOINT.as_slice()
        );
        // 750_000 = 0x0b71b0
        assert_eq!(&init_code[66..69], &[0x0b, 0x71, 0xb0]);
    }

    #[tokio::test]
    async fn test_remote_chain_without_home_record() {
        let fixture = Fixture::new();
        let deployer = fixture.deployer(MockChain::new(ARB_SEPOLIA));

        let err = deployer.deploy().await.unwrap_err();

        assert!(matches!(err, DeployError::NotDeployed(SEPOLIA)));
        // The deployment itself is recorded before peering is attempted.
        assert_eq!(fixture.store().get(ARB_SEPOLIA).unwrap(), DEPLOYED);
        assert!(fixture.abi_path().exists());
        assert!(deployer.chain().calls.lock().unwrap().peers.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_chain_never_deploys() {
        let fixture = Fixture::new();
        let deployer = fixture.deployer(MockChain::new(8453));

        let err = deployer.deploy().await.unwrap_err();

        assert!(matches!(err, DeployError::UnsupportedChain(8453)));
        assert!(deployer.chain().calls.lock().unwrap().deploys.is_empty());
        assert!(!fixture.store().yaml_path().exists());
    }

    #[tokio::test]
    async fn test_failed_deployment_records_nothing() {
        let fixture = Fixture::new();
        let mut chain = MockChain::new(ARB_SEPOLIA);
        chain.fail_deploy = true;
        let deployer = fixture.deployer(chain);

        let err = deployer.deploy().await.unwrap_err();

        assert!(matches!(err, DeployError::DeploymentFailed { chain_id: ARB_SEPOLIA, .. }));
        assert!(!fixture.store().yaml_path().exists());
        assert!(!fixture.abi_path().exists());
    }

    #[tokio::test]
    async fn test_configurable_home_chain() {
        let fixture = Fixture::new();
        fixture.store().record(ARB_SEPOLIA, HOME_RELAYER).unwrap();
        let deployer = fixture
            .deployer(MockChain::new(SEPOLIA))
            .home_chain_id(ARB_SEPOLIA);

        let report = deployer.deploy().await.unwrap();

        let link = report.peer.unwrap();
        assert_eq!(link.eid, 1);
        assert_eq!(link.peer, HOME_RELAYER);
    }

    #[tokio::test]
    async fn test_set_peer_uses_recorded_addresses() {
        let fixture = Fixture::new();
        fixture.store().record(SEPOLIA, HOME_RELAYER).unwrap();
        fixture.store().record(ARB_SEPOLIA, DEPLOYED).unwrap();
        let deployer = fixture.deployer(MockChain::new(ARB_SEPOLIA));

        let link = deployer.set_peer().await.unwrap();

        assert_eq!(link.contract, DEPLOYED);
        assert_eq!(link.peer, HOME_RELAYER);
        let calls = deployer.chain().calls.lock().unwrap();
        assert!(calls.deploys.is_empty());
        assert_eq!(calls.peers.len(), 1);
    }

    #[tokio::test]
    async fn test_set_peer_without_home_record() {
        let fixture = Fixture::new();
        fixture.store().record(ARB_SEPOLIA, DEPLOYED).unwrap();
        let deployer = fixture.deployer(MockChain::new(ARB_SEPOLIA));

        let err = deployer.set_peer().await.unwrap_err();

        assert!(matches!(err, DeployError::NotDeployed(SEPOLIA)));
        assert!(deployer.chain().calls.lock().unwrap().peers.is_empty());
    }

    #[tokio::test]
    async fn test_set_peer_without_local_record() {
        let fixture = Fixture::new();
        fixture.store().record(SEPOLIA, HOME_RELAYER).unwrap();
        let deployer = fixture.deployer(MockChain::new(ARB_SEPOLIA));

        let err = deployer.set_peer().await.unwrap_err();

        assert!(matches!(err, DeployError::NotDeployed(ARB_SEPOLIA)));
        assert!(deployer.chain().calls.lock().unwrap().peers.is_empty());
    }

    #[tokio::test]
    async fn test_set_peer_on_home_chain_is_rejected() {
        let fixture = Fixture::new();
        fixture.store().record(SEPOLIA, HOME_RELAYER).unwrap();
        let deployer = fixture.deployer(MockChain::new(SEPOLIA));

        assert!(matches!(
            deployer.set_peer().await,
            Err(DeployError::Config(_))
        ));
    }
}
