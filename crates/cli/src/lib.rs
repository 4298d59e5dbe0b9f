pub mod args;
mod render;

use alloy::{primitives::U256, providers::DynProvider};
use anyhow::Context;
use args::Cli;
use dex_order_sdk::{
    ContractAddresses,
    order::{self, OrderDefaults, OrderFactory, SignedOrder},
    provider::{self, ProviderConfig},
    token::{RpcTokenDeployer, TokenHandle, TokenProvisioner, TokenRole},
};
use tracing::{Level, debug, info, warn};

/// Generates one signed order and prints it to stdout.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ProviderConfig::new(&cli.rpc_url)
        .with_private_key(cli.pk.clone())
        .with_throttle(cli.rpc_throttle);
    let provider = provider::connect(&config)
        .await
        .context("building provider")?;

    let signed = generate(&cli, &provider).await;

    // Release the transport before reporting, whatever the outcome.
    drop(provider);
    debug!("provider released");

    render::print(&signed?, cli.format)
}

async fn generate(cli: &Cli, provider: &DynProvider) -> anyhow::Result<SignedOrder> {
    let mut contracts = provider::resolve_chain(provider)
        .await
        .with_context(|| format!("resolving 0x contracts via {}", cli.rpc_url))?;
    if let Some(exchange) = cli.exchange {
        info!(%exchange, "overriding exchange address");
        contracts = contracts.with_exchange(exchange);
    }

    let (maker_token, taker_token) = provision_tokens(cli, provider).await?;

    sign_order(cli, provider, contracts, &maker_token, &taker_token).await
}

async fn provision_tokens(
    cli: &Cli,
    provider: &DynProvider,
) -> anyhow::Result<(TokenHandle<DynProvider>, TokenHandle<DynProvider>)> {
    let provisioner = TokenProvisioner::new(
        provider.clone(),
        RpcTokenDeployer::new(provider.clone(), &cli.token_artifact),
        cli.from,
    );

    let maker_token = provisioner
        .provision(TokenRole::Maker, cli.maker_token)
        .await
        .context("provisioning maker token")?;
    let taker_token = provisioner
        .provision(TokenRole::Taker, cli.taker_token)
        .await
        .context("provisioning taker token")?;

    if tracing::enabled!(Level::DEBUG) {
        for token in [&maker_token, &taker_token] {
            match token.describe().await {
                Ok(info) => debug!(role = %token.role(), address = %token.address(), ?info, "token"),
                Err(err) => {
                    debug!(role = %token.role(), address = %token.address(), "no token metadata: {:#}", err)
                },
            }
        }
    }

    Ok((maker_token, taker_token))
}

async fn sign_order(
    cli: &Cli,
    provider: &DynProvider,
    contracts: ContractAddresses,
    maker_token: &TokenHandle<DynProvider>,
    taker_token: &TokenHandle<DynProvider>,
) -> anyhow::Result<SignedOrder> {
    let factory = OrderFactory::from_private_key(
        cli.pk.as_deref(),
        OrderDefaults::erc20_pair(
            contracts.chain_id(),
            contracts.exchange(),
            cli.from,
            maker_token.address(),
            taker_token.address(),
        ),
    )
    .context("preparing order signer")?
    .with_signature_type(cli.signature_type);

    if factory.signer() != cli.from {
        warn!(
            signer = %factory.signer(),
            maker = %cli.from,
            "private key does not belong to the maker, the signature will not validate on-chain"
        );
    }

    let expiration = match cli.expiration {
        Some(expiration) => U256::from(expiration),
        None => order::default_expiration(
            provider::latest_block_timestamp(provider)
                .await
                .context("fetching latest block timestamp")?,
        ),
    };
    let salt = cli.salt.unwrap_or_else(order::random_salt);

    let signed = factory
        .new_signed_order(expiration, salt)
        .await
        .context("signing order")?;
    info!(order_hash = %signed.order.hash(), chain_id = contracts.chain_id(), "order signed");

    Ok(signed)
}
