use std::time::Duration;

use alloy::{
    eips::BlockId,
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::RpcClient,
    signers::local::PrivateKeySigner,
    transports::layers::ThrottleLayer,
};
use tracing::{debug, info};

use crate::{ContractAddresses, error::OrderError};

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Interval between polls while waiting for transaction receipts.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Receipt polls before a transaction is given up on, one minute in total.
pub const RECEIPT_MAX_POLLS: u32 = 240;

/// Provider chain configuration.
#[derive(Clone, derive_more::Debug)]
pub struct ProviderConfig {
    pub rpc_url: String,
    /// Hex-encoded key for the local signing layer, empty is the same as none.
    #[debug(skip)]
    pub private_key: Option<String>,
    /// Requests per second, unlimited if `None`.
    pub throttle: Option<u32>,
}

impl ProviderConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self { rpc_url: rpc_url.into(), private_key: None, throttle: None }
    }

    pub fn with_private_key(self, private_key: Option<String>) -> Self {
        Self { private_key, ..self }
    }

    pub fn with_throttle(self, throttle: Option<u32>) -> Self { Self { throttle, ..self } }
}

/// Parses a hex-encoded private key, with or without `0x` prefix.
pub fn parse_private_key(private_key: &str) -> Result<PrivateKeySigner, OrderError> {
    private_key
        .trim()
        .parse::<PrivateKeySigner>()
        .map_err(OrderError::InvalidPrivateKey)
}

/// Signer for the optional private key, `None` if the key is absent or empty.
pub fn optional_signer(private_key: Option<&str>) -> Result<Option<PrivateKeySigner>, OrderError> {
    match private_key.map(str::trim) {
        None | Some("") => Ok(None),
        Some(private_key) => parse_private_key(private_key).map(Some),
    }
}

/// Builds the provider chain: local signing layer (if a private key is set)
/// on top of the JSON-RPC transport.
///
/// No requests are made here, an unreachable endpoint is reported by the
/// first call made through the returned provider.
pub async fn connect(config: &ProviderConfig) -> Result<DynProvider, OrderError> {
    let client = if let Some(throttle) = config.throttle {
        RpcClient::builder()
            .layer(ThrottleLayer::new(throttle))
            .connect(&config.rpc_url)
            .await?
    } else {
        RpcClient::builder().connect(&config.rpc_url).await?
    };
    client.set_poll_interval(RECEIPT_POLL_INTERVAL);

    let provider = match optional_signer(config.private_key.as_deref())? {
        Some(signer) => {
            debug!(signer = %signer.address(), "signing transactions locally");
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_client(client)
                .erased()
        },
        None => {
            debug!("transactions are signed by the node");
            ProviderBuilder::new().connect_client(client).erased()
        },
    };
    info!(rpc_url = %config.rpc_url, throttle = ?config.throttle, "provider ready");
    Ok(provider)
}

/// Queries the chain ID and resolves well-known protocol contracts for it.
pub async fn resolve_chain<P: Provider>(provider: &P) -> Result<ContractAddresses, OrderError> {
    let chain_id = provider.get_chain_id().await?;
    let addresses = ContractAddresses::for_chain(chain_id)?;
    info!(chain_id, exchange = %addresses.exchange(), "resolved 0x contracts");
    Ok(addresses)
}

/// Timestamp of the latest block, in seconds.
pub async fn latest_block_timestamp<P: Provider>(provider: &P) -> Result<u64, OrderError> {
    let block = provider
        .get_block(BlockId::latest())
        .await?
        .ok_or(OrderError::MissingBlock)?;
    Ok(block.header.timestamp)
}
