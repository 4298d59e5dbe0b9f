use std::path::Path;

use alloy::primitives::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::error::OrderError;

/// Default location of the compiled `DummyERC20Token` artifact.
pub const DEFAULT_TOKEN_ARTIFACT: &str = "artifacts/DummyERC20Token.json";

/// Creation bytecode of a compiled token contract.
///
/// Accepts the layouts produced by the common toolchains:
/// * 0x artifacts: `compilerOutput.evm.bytecode.object`
/// * Hardhat: `bytecode` as a hex string
/// * Foundry: `bytecode.object`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenArtifact {
    bytecode: Bytes,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    bytecode: Option<RawBytecode>,
    compiler_output: Option<RawCompilerOutput>,
}

#[derive(Deserialize)]
struct RawCompilerOutput {
    evm: RawEvm,
}

#[derive(Deserialize)]
struct RawEvm {
    bytecode: RawBytecode,
}

impl RawBytecode {
    fn into_hex(self) -> String {
        match self {
            RawBytecode::Hex(hex) | RawBytecode::Object { object: hex } => hex,
        }
    }
}

impl TokenArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OrderError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|source| OrderError::ArtifactRead { path: path.to_path_buf(), source })?;
        let artifact = Self::from_json(&json)?;
        debug!(path = %path.display(), size = artifact.bytecode.len(), "loaded token artifact");
        Ok(artifact)
    }

    pub fn from_json(json: &str) -> Result<Self, OrderError> {
        let raw: RawArtifact = serde_json::from_str(json)?;
        let hex = raw
            .compiler_output
            .map(|output| output.evm.bytecode)
            .or(raw.bytecode)
            .map(RawBytecode::into_hex)
            .ok_or_else(|| OrderError::ArtifactBytecode("bytecode field not found".to_string()))?;
        Self::from_hex(&hex)
    }

    pub fn from_hex(hex: &str) -> Result<Self, OrderError> {
        if hex.contains("__") {
            return Err(OrderError::ArtifactBytecode("bytecode has unlinked libraries".to_string()));
        }
        let bytecode = alloy::hex::decode(hex.trim())
            .map_err(|err| OrderError::ArtifactBytecode(err.to_string()))?;
        if bytecode.is_empty() {
            return Err(OrderError::ArtifactBytecode(
                "bytecode is empty, is the contract abstract?".to_string(),
            ));
        }
        Ok(Self { bytecode: bytecode.into() })
    }

    pub fn bytecode(&self) -> &Bytes { &self.bytecode }

    /// Creation code followed by the abi-encoded constructor arguments.
    pub fn deploy_code(&self, constructor_args: &[u8]) -> Bytes {
        let mut code = Vec::with_capacity(self.bytecode.len() + constructor_args.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(constructor_args);
        code.into()
    }
}
