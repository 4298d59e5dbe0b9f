use std::path::PathBuf;

use alloy::{
    signers::local::LocalSignerError,
    transports::{RpcError, TransportErrorKind},
};
use thiserror::Error;

/// Broad category of an [`OrderError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid arguments or local inputs, detected before any network call.
    Configuration,
    /// Endpoint unreachable or misbehaving.
    Connectivity,
    /// Protocol is not deployed on the chain.
    UnknownChain,
    /// Token contract could not be deployed.
    Deployment,
    /// Order could not be signed.
    Signing,
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid asset data: {0}")]
    InvalidAssetData(String),

    #[error("failed to read token artifact {path}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed token artifact")]
    ArtifactFormat(#[from] serde_json::Error),

    #[error("token artifact has no deployable bytecode: {0}")]
    ArtifactBytecode(String),

    #[error("RPC request failed")]
    Transport(#[from] RpcError<TransportErrorKind>),

    #[error("endpoint returned no latest block")]
    MissingBlock,

    #[error("contract call failed")]
    Contract(#[from] alloy::contract::Error),

    #[error("no known 0x contract addresses for chain {0}")]
    UnknownChain(u64),

    #[error("deployment failed: {0}")]
    Deployment(String),

    #[error("private key is required to sign the order")]
    MissingPrivateKey,

    #[error("invalid private key")]
    InvalidPrivateKey(#[source] LocalSignerError),

    #[error("signing failed")]
    Signer(#[from] alloy::signers::Error),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidArgument(_)
            | OrderError::InvalidAssetData(_)
            | OrderError::ArtifactRead { .. }
            | OrderError::ArtifactFormat(_)
            | OrderError::ArtifactBytecode(_) => ErrorKind::Configuration,
            OrderError::Transport(_)
            | OrderError::MissingBlock
            | OrderError::Contract(_) => ErrorKind::Connectivity,
            OrderError::UnknownChain(_) => ErrorKind::UnknownChain,
            OrderError::Deployment(_) => ErrorKind::Deployment,
            OrderError::MissingPrivateKey
            | OrderError::InvalidPrivateKey(_)
            | OrderError::Signer(_)
            | OrderError::InvalidSignature(_) => ErrorKind::Signing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(OrderError::UnknownChain(5).kind(), ErrorKind::UnknownChain);
        assert_eq!(OrderError::MissingPrivateKey.kind(), ErrorKind::Signing);
        assert_eq!(OrderError::Deployment("reverted".into()).kind(), ErrorKind::Deployment);
        assert_eq!(
            OrderError::Transport(TransportErrorKind::backend_gone()).kind(),
            ErrorKind::Connectivity
        );
        assert_eq!(OrderError::MissingBlock.kind(), ErrorKind::Connectivity);
        assert_eq!(
            OrderError::ArtifactBytecode("empty".into()).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn unknown_chain_message() {
        assert_eq!(
            OrderError::UnknownChain(31337).to_string(),
            "no known 0x contract addresses for chain 31337"
        );
    }
}
