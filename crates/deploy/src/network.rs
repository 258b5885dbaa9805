//! Static registry of the networks the relayer knows about.
//!
//! Only a subset of the known networks has a LayerZero endpoint configured;
//! the rest resolve to a chain ID but cannot host a relayer deployment.

use std::str::FromStr;

use alloy::primitives::{Address, address};

use crate::error::{DeployError, Result};

/// CreateX factory, deployed at the same address on every supported chain.
pub const CREATEX_ADDRESS: Address = address!("0xba5Ed099633D3B313e4D5F7bdc1305d3c28ba5Ed");

/// LayerZero V2 endpoint shared by the supported testnets.
pub const LZ_TESTNET_ENDPOINT: Address = address!("0x6EDCE65403992e310A62460808c4b910D972f10f");

/// Gas limit passed to the relayer constructor.
pub const RELAYER_GAS_LIMIT: u64 = 500_000;

/// Chain holding the reference deployment every other chain peers with (Sepolia).
pub const DEFAULT_HOME_CHAIN_ID: u64 = 11155111;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Network {
    Mainnet,
    Optimism,
    Bsc,
    Gnosis,
    Polygon,
    Base,
    Arbitrum,
    Avax,
    ArbitrumSepolia,
    Sepolia,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Optimism => 10,
            Network::Bsc => 56,
            Network::Gnosis => 100,
            Network::Polygon => 137,
            Network::Base => 8453,
            Network::Arbitrum => 42161,
            Network::Avax => 43114,
            Network::ArbitrumSepolia => 421614,
            Network::Sepolia => 11155111,
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        use strum::IntoEnumIterator;

        Self::iter().find(|network| network.chain_id() == chain_id)
    }
}

/// Resolve a kebab-case network name (`arbitrum-sepolia`, `sepolia`, ...) to its chain ID.
pub fn chain_id_for(name: &str) -> Result<u64> {
    Network::from_str(name)
        .map(|network| network.chain_id())
        .map_err(|_| DeployError::UnknownNetwork(name.to_string()))
}

/// Address of the LayerZero endpoint passed to the relayer constructor on `chain_id`.
pub fn messaging_endpoint_for(chain_id: u64) -> Result<Address> {
    match Network::from_chain_id(chain_id) {
        Some(Network::ArbitrumSepolia | Network::Sepolia) => Ok(LZ_TESTNET_ENDPOINT),
        _ => Err(DeployError::UnsupportedChain(chain_id)),
    }
}

/// Endpoint ID the messaging layer uses to address `chain_id` when registering peers.
pub fn messaging_eid_for(chain_id: u64) -> Result<u32> {
    match Network::from_chain_id(chain_id) {
        Some(Network::ArbitrumSepolia) => Ok(1),
        Some(Network::Sepolia) => Ok(4294967294),
        _ => Err(DeployError::UnsupportedChain(chain_id)),
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    const SUPPORTED: [u64; 2] = [421614, 11155111];

    #[test]
    fn test_chain_id_for_known_names() {
        assert_eq!(chain_id_for("arbitrum-sepolia").unwrap(), 421614);
        assert_eq!(chain_id_for("sepolia").unwrap(), 11155111);
        assert_eq!(chain_id_for("base").unwrap(), 8453);
    }

    #[test]
    fn test_chain_id_for_unknown_name() {
        let err = chain_id_for("goerli").unwrap_err();
        assert!(matches!(err, DeployError::UnknownNetwork(name) if name == "goerli"));

        // Names are kebab-case only.
        assert!(chain_id_for("ArbitrumSepolia").is_err());
    }

    #[test]
    fn test_network_chain_ids_are_unique() {
        for network in Network::iter() {
            assert_eq!(Network::from_chain_id(network.chain_id()), Some(network));
        }
    }

    #[test]
    fn test_supported_chains_resolve() {
        for chain_id in SUPPORTED {
            assert_eq!(messaging_endpoint_for(chain_id).unwrap(), LZ_TESTNET_ENDPOINT);
            assert!(messaging_eid_for(chain_id).is_ok());
        }
        assert_eq!(messaging_eid_for(DEFAULT_HOME_CHAIN_ID).unwrap(), 4294967294);
    }

    #[test]
    fn test_unsupported_chains_fail() {
        let known_unsupported = Network::iter()
            .map(|network| network.chain_id())
            .filter(|chain_id| !SUPPORTED.contains(chain_id));

        for chain_id in known_unsupported.chain([0, 5, 999_999]) {
            assert!(matches!(
                messaging_endpoint_for(chain_id),
                Err(DeployError::UnsupportedChain(id)) if id == chain_id
            ));
            assert!(matches!(
                messaging_eid_for(chain_id),
                Err(DeployError::UnsupportedChain(id)) if id == chain_id
            ));
        }
    }
}
