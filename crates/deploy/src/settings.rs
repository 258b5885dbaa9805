//! Process configuration for a deployment run.
//!
//! Settings are layered with figment: built-in defaults, then an optional
//! `Relayer.toml`, then the raw `WEB3_PK`/`WEB3_PROVIDER_URL`/`DEBUG`/`DEV`/`HOME_CHAIN_ID`
//! environment variables, then `RELAYER_`-prefixed overrides (`RELAYER_PATHS__ABI=...`).

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use crate::{
    artifact::ArtifactSource,
    error::{DeployError, Result},
    network::{DEFAULT_HOME_CHAIN_ID, RELAYER_GAS_LIMIT},
    store::DeploymentStore,
};

/// The default name of the optional settings file.
pub const SETTINGS_FILENAME: &str = "Relayer.toml";

/// Plain environment variables read without a prefix.
const RAW_ENV_KEYS: [&str; 5] = ["web3_pk", "web3_provider_url", "debug", "dev", "home_chain_id"];

/// File locations, relative to [`Settings::project_root`] unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentPaths {
    /// Vyper source of the relayer.
    pub contract_source: PathBuf,
    /// Pre-compiled artifact. When set, the compiler is not invoked.
    pub artifact: Option<PathBuf>,
    /// Vyper compiler binary.
    pub vyper: PathBuf,
    /// Human-edited deployments record.
    pub deployments_yaml: PathBuf,
    /// Machine-consumed mirror of the deployments record.
    pub deployments_json: PathBuf,
    /// ABI descriptor for the relayer backend.
    pub abi: PathBuf,
}

impl Default for DeploymentPaths {
    fn default() -> Self {
        Self {
            contract_source: PathBuf::from("contracts/GasRelayer.vy"),
            artifact: None,
            vyper: PathBuf::from("vyper"),
            deployments_yaml: PathBuf::from("deploy/deployments.yaml"),
            deployments_json: PathBuf::from("gas_bridger/deployments.json"),
            abi: PathBuf::from("gas_bridger/abi/gas_relayer.json"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Defaults the log level to `DEBUG`.
    #[serde(default, deserialize_with = "flag")]
    pub debug: bool,
    /// Accepted so environments shared with the relayer backend load unchanged. Only
    /// reported in the startup log.
    #[serde(default, deserialize_with = "flag")]
    pub dev: bool,

    /// Deployer private key (hex).
    pub web3_pk: String,
    /// JSON-RPC endpoint of the target chain.
    pub web3_provider_url: String,

    /// Chain holding the reference deployment. Deployments elsewhere peer with it.
    #[serde(default = "default_home_chain_id")]
    pub home_chain_id: u64,
    /// Gas limit passed to the relayer constructor.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,
    #[serde(default)]
    pub paths: DeploymentPaths,
}

/// Boolean switch as written in environment files: `true`/`false` in any case,
/// `1`/`0`, `yes`/`no`, `on`/`off`, `y`/`n` or `t`/`f`.
fn flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(de)? {
        Raw::Bool(value) => Ok(value),
        Raw::Int(0) => Ok(false),
        Raw::Int(1) => Ok(true),
        Raw::Int(n) => Err(D::Error::custom(format!("invalid boolean {n}"))),
        Raw::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
            "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
            _ => Err(D::Error::custom(format!("invalid boolean {text:?}"))),
        },
    }
}

fn default_home_chain_id() -> u64 {
    DEFAULT_HOME_CHAIN_ID
}

fn default_gas_limit() -> u64 {
    RELAYER_GAS_LIMIT
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("debug", &self.debug)
            .field("dev", &self.dev)
            .field("web3_pk", &"<redacted>")
            .field("web3_provider_url", &self.web3_provider_url)
            .field("home_chain_id", &self.home_chain_id)
            .field("gas_limit", &self.gas_limit)
            .field("project_root", &self.project_root)
            .field("paths", &self.paths)
            .finish()
    }
}

impl Settings {
    /// Load settings from the environment and `config_file` (or `Relayer.toml` in the
    /// working directory when absent).
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let figment = match config_file {
            Some(path) if !path.exists() => {
                return Err(DeployError::Config(format!(
                    "settings file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Self::figment(path),
            None => Self::figment(Path::new(SETTINGS_FILENAME)),
        };

        Self::from_figment(figment)
    }

    /// The layered providers, exposed so callers can add their own on top.
    pub fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::default("paths", DeploymentPaths::default()))
            .merge(Toml::file(config_file))
            .merge(Env::raw().only(&RAW_ENV_KEYS))
            .merge(Env::prefixed("RELAYER_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Self = figment
            .extract()
            .map_err(|e| DeployError::Config(e.to_string()))?;
        settings.validate()?;

        tracing::debug!(settings = ?settings, "Settings loaded");
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.web3_pk.trim().is_empty() {
            return Err(DeployError::Config("WEB3_PK is empty".to_string()));
        }
        if self.web3_provider_url.trim().is_empty() {
            return Err(DeployError::Config("WEB3_PROVIDER_URL is empty".to_string()));
        }
        Ok(())
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.project_root.join(path)
    }

    pub fn deployment_store(&self) -> DeploymentStore {
        DeploymentStore::new(
            self.resolve(&self.paths.deployments_yaml),
            self.resolve(&self.paths.deployments_json),
        )
    }

    pub fn artifact_source(&self) -> ArtifactSource {
        match &self.paths.artifact {
            Some(artifact) => ArtifactSource::File(self.resolve(artifact)),
            None => ArtifactSource::Vyper {
                compiler: self.paths.vyper.clone(),
                source: self.resolve(&self.paths.contract_source),
            },
        }
    }

    pub fn abi_path(&self) -> PathBuf {
        self.resolve(&self.paths.abi)
    }
}
