//! Salts for CreateX `deployCreate3`.
//!
//! CreateX reads the salt as `deployer (20 bytes) | flag (1 byte) | entropy (11 bytes)`.
//! A salt whose first 20 bytes equal `msg.sender` is permissioned: nobody else can
//! front-run the deployment at the same address. A zero flag disables CreateX's
//! cross-chain redeploy protection, so the same salt yields the same address on
//! every chain.

use alloy::primitives::{Address, B256};
use derive_more::{Deref, Display};
use rand::Rng;

/// Flag byte written after the deployer address.
pub const CROSS_CHAIN_FLAG: u8 = 0x00;

/// Number of random bytes at the end of the salt.
pub const ENTROPY_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deref, Display)]
pub struct Create3Salt(B256);

impl Create3Salt {
    /// Build a fresh salt guarded by `deployer`.
    pub fn generate(deployer: Address) -> Self {
        let mut entropy = [0u8; ENTROPY_LEN];
        rand::rng().fill(&mut entropy);
        Self::from_parts(deployer, entropy)
    }

    pub fn from_parts(deployer: Address, entropy: [u8; ENTROPY_LEN]) -> Self {
        let mut salt = [0u8; 32];
        salt[..20].copy_from_slice(deployer.as_slice());
        salt[20] = CROSS_CHAIN_FLAG;
        salt[21..].copy_from_slice(&entropy);
        Self(B256::from(salt))
    }

    pub fn deployer(&self) -> Address {
        Address::from_slice(&self.0[..20])
    }

    pub fn flag(&self) -> u8 {
        self.0[20]
    }

    pub fn entropy(&self) -> &[u8] {
        &self.0[21..]
    }

    pub fn as_b256(&self) -> B256 {
        self.0
    }
}
