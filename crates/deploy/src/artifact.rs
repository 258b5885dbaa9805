//! Compiled relayer contract: bytecode for deployment, ABI for downstream services.

use std::path::{Path, PathBuf};

use alloy::{
    json_abi::JsonAbi,
    primitives::{Address, Bytes, U256},
    sol_types::SolValue,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DeployError, Result},
    store::write_atomic,
};

/// Where the relayer bytecode and ABI come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSource {
    /// Compile a Vyper source file with the given compiler binary.
    Vyper { compiler: PathBuf, source: PathBuf },
    /// Read a pre-compiled `{ "abi": [...], "bytecode": "0x..." }` file.
    File(PathBuf),
}

impl ArtifactSource {
    pub async fn load(&self) -> Result<ContractArtifact> {
        match self {
            ArtifactSource::Vyper { compiler, source } => compile_vyper(compiler, source).await,
            ArtifactSource::File(path) => ContractArtifact::from_file(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArtifact {
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeployError::Artifact(format!("{}: {e}", path.display())))?;
        let artifact: Self = serde_json::from_str(&content)
            .map_err(|e| DeployError::Artifact(format!("{}: {e}", path.display())))?;

        artifact.ensure_bytecode()?;
        Ok(artifact)
    }

    fn ensure_bytecode(&self) -> Result<()> {
        if self.bytecode.is_empty() {
            return Err(DeployError::Artifact("contract bytecode is empty".to_string()));
        }
        Ok(())
    }

    /// Creation code handed to the factory: bytecode followed by the ABI-encoded
    /// `(address endpoint, uint256 gas_limit)` constructor arguments.
    pub fn init_code(&self, endpoint: Address, gas_limit: u64) -> Bytes {
        let args = (endpoint, U256::from(gas_limit)).abi_encode_params();

        let mut code = Vec::with_capacity(self.bytecode.len() + args.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(&args);
        code.into()
    }

    /// Write the ABI descriptor consumed by the relayer backend.
    pub fn write_abi(&self, path: &Path) -> Result<()> {
        let mut json = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
        self.abi
            .serialize(&mut serializer)
            .map_err(|e| DeployError::store(path, e))?;
        json.push(b'\n');

        write_atomic(path, &json)?;
        tracing::debug!(path = %path.display(), "ABI written");
        Ok(())
    }
}

async fn compile_vyper(compiler: &Path, source: &Path) -> Result<ContractArtifact> {
    tracing::info!(
        compiler = %compiler.display(),
        source = %source.display(),
        "Compiling relayer contract..."
    );

    let output = tokio::process::Command::new(compiler)
        .arg("-f")
        .arg("abi,bytecode")
        .arg(source)
        .output()
        .await
        .map_err(|e| {
            DeployError::Artifact(format!("failed to run {}: {e}", compiler.display()))
        })?;

    if !output.status.success() {
        return Err(DeployError::Artifact(format!(
            "{} exited with {}: {}",
            compiler.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_vyper_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `vyper -f abi,bytecode` output: the ABI JSON on one line, the hex bytecode
/// on the next.
fn parse_vyper_output(stdout: &str) -> Result<ContractArtifact> {
    let mut lines = stdout.lines().map(str::trim).filter(|line| !line.is_empty());

    let abi = lines
        .next()
        .ok_or_else(|| DeployError::Artifact("compiler produced no ABI".to_string()))?;
    let bytecode = lines
        .next()
        .ok_or_else(|| DeployError::Artifact("compiler produced no bytecode".to_string()))?;

    let abi: JsonAbi = serde_json::from_str(abi)
        .map_err(|e| DeployError::Artifact(format!("invalid ABI from compiler: {e}")))?;
    let bytecode: Bytes = bytecode
        .parse()
        .map_err(|e| DeployError::Artifact(format!("invalid bytecode from compiler: {e}")))?;

    let artifact = ContractArtifact { abi, bytecode };
    artifact.ensure_bytecode()?;
    Ok(artifact)
}
