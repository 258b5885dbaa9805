//! Connection to the target chain: the CreateX factory and the deployed relayer.

use std::future::Future;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256, Bytes},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
};
use url::Url;

use crate::{
    error::{DeployError, Result},
    network::CREATEX_ADDRESS,
    salt::Create3Salt,
};

sol! {
    /// Subset of the CreateX factory used for CREATE3 deployments.
    #[sol(rpc)]
    interface ICreateX {
        event ContractCreation(address indexed newContract);

        function deployCreate3(bytes32 salt, bytes memory initCode) external payable returns (address newContract);
    }

    /// Peer registration entry point of the GasRelayer contract.
    #[sol(rpc)]
    interface IGasRelayer {
        function set_peer(uint32 _eid, address _peer) external;
    }
}

/// Operations the orchestrator needs from a connected chain.
pub trait RelayerChain {
    /// Chain ID reported by the RPC endpoint.
    fn chain_id(&self) -> u64;

    /// Address of the signing account.
    fn deployer(&self) -> Address;

    /// Deploy `init_code` through CreateX `deployCreate3` and return the new contract address.
    fn deploy_create3(
        &self,
        salt: Create3Salt,
        init_code: Bytes,
    ) -> impl Future<Output = Result<Address>> + Send;

    /// Call `set_peer(eid, peer)` on the relayer at `contract`, returning the transaction hash.
    fn set_peer(
        &self,
        contract: Address,
        eid: u32,
        peer: Address,
    ) -> impl Future<Output = Result<B256>> + Send;
}

/// [`RelayerChain`] backed by an alloy HTTP provider with the deployer's wallet attached.
#[derive(Clone)]
pub struct AlloyChain {
    provider: DynProvider,
    deployer: Address,
    chain_id: u64,
}

impl std::fmt::Debug for AlloyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyChain")
            .field("deployer", &self.deployer)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl AlloyChain {
    /// Connect to `rpc_url` and register `private_key` as the signer.
    ///
    /// Fails with [`DeployError::Connection`] if the key is malformed or the endpoint
    /// does not answer `eth_chainId`.
    pub async fn connect(rpc_url: &str, private_key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| DeployError::Connection(format!("invalid signing key: {e}")))?;
        let url: Url = rpc_url
            .parse()
            .map_err(|e| DeployError::Connection(format!("invalid RPC URL {rpc_url:?}: {e}")))?;

        let deployer = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| DeployError::Connection(format!("RPC endpoint unreachable: {e}")))?;

        tracing::info!(chain_id, deployer = %deployer, "Connected to chain");

        Ok(Self {
            provider,
            deployer,
            chain_id,
        })
    }
}

impl RelayerChain for AlloyChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn deploy_create3(&self, salt: Create3Salt, init_code: Bytes) -> Result<Address> {
        let chain_id = self.chain_id;
        let failed = |reason: String| DeployError::DeploymentFailed { chain_id, reason };

        let factory = ICreateX::new(CREATEX_ADDRESS, &self.provider);
        let call = factory.deployCreate3(salt.as_b256(), init_code);

        // Dry run first: a revert surfaces here with its reason, and the return value
        // is the address CreateX will deploy to.
        let predicted = call
            .call()
            .await
            .map_err(|e| failed(format!("simulation reverted: {e}")))?;

        let pending = call
            .send()
            .await
            .map_err(|e| failed(format!("failed to send transaction: {e}")))?;
        tracing::debug!(tx_hash = %pending.tx_hash(), "Deployment transaction sent");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| failed(format!("failed to get receipt: {e}")))?;

        if !receipt.status() {
            return Err(failed(format!(
                "transaction {} reverted",
                receipt.transaction_hash
            )));
        }

        let created = receipt
            .inner
            .logs()
            .iter()
            .filter(|log| log.address() == CREATEX_ADDRESS)
            .find_map(|log| log.log_decode::<ICreateX::ContractCreation>().ok())
            .map(|log| log.inner.data.newContract);

        match created {
            Some(address) if address != predicted => {
                tracing::warn!(
                    predicted = %predicted,
                    created = %address,
                    "Deployed address differs from simulation"
                );
                Ok(address)
            }
            Some(address) => Ok(address),
            None => Ok(predicted),
        }
    }

    async fn set_peer(&self, contract: Address, eid: u32, peer: Address) -> Result<B256> {
        let chain_id = self.chain_id;
        let failed = |reason: String| DeployError::PeerRegistrationFailed { chain_id, reason };

        let relayer = IGasRelayer::new(contract, &self.provider);
        let receipt = relayer
            .set_peer(eid, peer)
            .send()
            .await
            .map_err(|e| failed(format!("failed to send transaction: {e}")))?
            .get_receipt()
            .await
            .map_err(|e| failed(format!("failed to get receipt: {e}")))?;

        if !receipt.status() {
            return Err(failed(format!(
                "transaction {} reverted",
                receipt.transaction_hash
            )));
        }

        Ok(receipt.transaction_hash)
    }
}
