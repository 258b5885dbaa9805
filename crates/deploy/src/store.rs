//! On-disk record of relayer deployments, keyed by chain ID.
//!
//! The YAML file is the source of truth and the one humans edit. The JSON file is
//! derived from it on every write for services that consume the addresses.
//!
//! Addresses are written as single-quoted strings (`421614: '0x...'`) so YAML readers
//! that resolve `0x` scalars as integers still see the address. Chain IDs may be
//! quoted or bare when the file is edited by hand.

use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::primitives::Address;
use derive_more::{Deref, DerefMut, From};
use fs2::FileExt;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _, ser::SerializeMap};

use crate::error::{DeployError, Result};

/// Chain ID to relayer address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut, From)]
pub struct Deployments(BTreeMap<u64, Address>);

impl Serialize for Deployments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (chain_id, address) in &self.0 {
            map.serialize_entry(chain_id, &address.to_checksum(None))?;
        }
        map.end()
    }
}

/// Chain ID key of the YAML record, bare (`421614`) or quoted (`'421614'`).
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct ChainKey(u64);

impl<'de> Deserialize<'de> for ChainKey {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(u64),
            Text(String),
        }

        match Raw::deserialize(de)? {
            Raw::Id(id) => Ok(Self(id)),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map(Self)
                .map_err(|_| D::Error::custom(format!("invalid chain ID {text:?}"))),
        }
    }
}

impl Deployments {
    fn from_raw(raw: BTreeMap<ChainKey, String>, path: &Path) -> Result<Self> {
        raw.into_iter()
            .map(|(ChainKey(chain_id), address)| {
                Address::from_str(address.trim())
                    .map(|address| (chain_id, address))
                    .map_err(|e| {
                        DeployError::store(
                            path,
                            format!("invalid address {address:?} for chain {chain_id}: {e}"),
                        )
                    })
            })
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Self)
    }

    /// Block-style YAML with every address single-quoted.
    fn to_yaml(&self) -> String {
        if self.0.is_empty() {
            return "{}\n".to_string();
        }

        self.0
            .iter()
            .map(|(chain_id, address)| format!("{chain_id}: '{}'\n", address.to_checksum(None)))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentStore {
    yaml_path: PathBuf,
    json_path: PathBuf,
}

impl DeploymentStore {
    pub fn new(yaml_path: impl Into<PathBuf>, json_path: impl Into<PathBuf>) -> Self {
        Self {
            yaml_path: yaml_path.into(),
            json_path: json_path.into(),
        }
    }

    pub fn yaml_path(&self) -> &Path {
        &self.yaml_path
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    /// Read the recorded deployments. A missing file is the first-run case and yields
    /// an empty map.
    pub fn load(&self) -> Result<Deployments> {
        if !self.yaml_path.exists() {
            tracing::debug!(path = %self.yaml_path.display(), "No deployments file yet");
            return Ok(Deployments::default());
        }

        let content = fs::read_to_string(&self.yaml_path)
            .map_err(|e| DeployError::store(&self.yaml_path, e))?;

        if content.trim().is_empty() {
            return Ok(Deployments::default());
        }

        let raw: Option<BTreeMap<ChainKey, String>> = serde_yaml::from_str(&content)
            .map_err(|e| DeployError::store(&self.yaml_path, e))?;

        Deployments::from_raw(raw.unwrap_or_default(), &self.yaml_path)
    }

    /// Overwrite both files with `deployments`.
    ///
    /// Each file is replaced through a temp file + rename, so a crash leaves every
    /// file either old or new. The JSON can still lag the YAML if the process dies
    /// between the two renames; `sync_json` repairs that.
    pub fn save(&self, deployments: &Deployments) -> Result<()> {
        write_atomic(&self.yaml_path, deployments.to_yaml().as_bytes())?;

        self.write_json(deployments)?;

        tracing::debug!(
            yaml = %self.yaml_path.display(),
            json = %self.json_path.display(),
            entries = deployments.len(),
            "Deployments saved"
        );

        Ok(())
    }

    pub fn get(&self, chain_id: u64) -> Result<Address> {
        self.load()?
            .get(&chain_id)
            .copied()
            .ok_or(DeployError::NotDeployed(chain_id))
    }

    /// Record `address` for `chain_id`, overwriting any previous entry.
    ///
    /// The read-modify-write runs under an exclusive lock on a sibling `.lock` file
    /// so concurrent deploys to different chains do not drop each other's entries.
    pub fn record(&self, chain_id: u64, address: Address) -> Result<Deployments> {
        let _lock = self.lock()?;

        let mut deployments = self.load()?;
        if let Some(previous) = deployments.insert(chain_id, address) {
            tracing::warn!(
                chain_id,
                previous = %previous,
                address = %address,
                "Overwriting existing deployment record"
            );
        }
        self.save(&deployments)?;

        Ok(deployments)
    }

    /// Regenerate the JSON file from the YAML source of truth.
    pub fn sync_json(&self) -> Result<Deployments> {
        let deployments = self.load()?;
        self.write_json(&deployments)?;
        Ok(deployments)
    }

    fn write_json(&self, deployments: &Deployments) -> Result<()> {
        let mut json = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
        deployments
            .serialize(&mut serializer)
            .map_err(|e| DeployError::store(&self.json_path, e))?;
        json.push(b'\n');

        write_atomic(&self.json_path, &json)
    }

    fn lock(&self) -> Result<StoreLock> {
        let path = self.yaml_path.with_extension("lock");
        create_parent_dir(&path)?;

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| DeployError::store(&path, e))?;
        file.lock_exclusive()
            .map_err(|e| DeployError::store(&path, e))?;

        Ok(StoreLock(file))
    }
}

/// Releases the store lock when dropped.
struct StoreLock(File);

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.0) {
            tracing::warn!(err = %e, "Failed to release deployments lock");
        }
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DeployError::store(parent, e))?;
    }
    Ok(())
}

/// Write `contents` next to `path` and rename it into place.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    create_parent_dir(path)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents).map_err(|e| DeployError::store(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| DeployError::store(path, e))?;

    Ok(())
}
