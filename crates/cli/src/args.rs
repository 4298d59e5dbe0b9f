use std::path::PathBuf;

use alloy::primitives::{Address, U256};
use clap::{Parser, ValueEnum};
use dex_order_sdk::{artifact, order::SignatureType, provider};

#[derive(Parser, Debug)]
#[command(
    name = "dex-order",
    version,
    about = "Generates a signed 0x v3 order, deploying dummy tokens if needed",
    after_help = "Full usage example:\n  dex-order --rpc-url http://localhost:8545 \
                  --from 0x5409ed021d9299bf6814279a6a1411a7e866a631 \
                  --pk 0xf2f48ee19680706196e2e339e5da3491186e0c4c5030670656b0e0164837257d"
)]
pub struct Cli {
    /// Endpoint where backing Ethereum JSON RPC interface is available
    #[arg(long, env = "DEX_ORDER_RPC_URL", default_value_t = provider::DEFAULT_RPC_URL.to_string())]
    pub rpc_url: String,

    /// Ethereum address from which to deploy the contracts, also the order
    /// maker
    #[arg(long, env = "DEX_ORDER_FROM")]
    pub from: Address,

    /// Private key for the `from` address
    #[arg(long, env = "DEX_ORDER_PK", hide_env_values = true)]
    pub pk: Option<String>,

    /// Address of the maker token [default: deploy a new dummy token]
    #[arg(long, env = "DEX_ORDER_MAKER_TOKEN")]
    pub maker_token: Option<Address>,

    /// Address of the taker token [default: deploy a new dummy token]
    #[arg(long, env = "DEX_ORDER_TAKER_TOKEN")]
    pub taker_token: Option<Address>,

    /// Compiled DummyERC20Token artifact used to deploy tokens
    #[arg(long, env = "DEX_ORDER_TOKEN_ARTIFACT", default_value = artifact::DEFAULT_TOKEN_ARTIFACT)]
    pub token_artifact: PathBuf,

    /// Exchange smart contract address [default: well-known address for the
    /// chain]
    #[arg(long, env = "DEX_ORDER_EXCHANGE")]
    pub exchange: Option<Address>,

    /// Order salt [default: random]
    #[arg(long)]
    pub salt: Option<U256>,

    /// Order expiration, unix seconds [default: latest block timestamp + 10
    /// days]
    #[arg(long)]
    pub expiration: Option<u64>,

    /// How the order hash is signed
    #[arg(long, default_value_t = SignatureType::EthSign)]
    pub signature_type: SignatureType,

    /// Output format of the signed order
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// RPC throttling (req/sec) [default: none]
    #[arg(long, env = "DEX_ORDER_RPC_THROTTLE")]
    pub rpc_throttle: Option<u32>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "DEX_ORDER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON, as accepted by 0x tooling
    Json,
    /// Human-readable table
    Table,
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn from_is_required() {
        let err = Cli::try_parse_from(["dex-order", "--pk", "0x01"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn defaults() {
        let cli =
            Cli::try_parse_from(["dex-order", "--from", "0x5409ED021D9299bf6814279A6A1411A7e866A631"])
                .unwrap();
        assert_eq!(cli.rpc_url, "http://localhost:8545");
        assert_eq!(cli.from, address!("0x5409ed021d9299bf6814279a6a1411a7e866a631"));
        assert_eq!(cli.pk, None);
        assert_eq!(cli.maker_token, None);
        assert_eq!(cli.taker_token, None);
        assert_eq!(cli.signature_type, SignatureType::EthSign);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.token_artifact, PathBuf::from(artifact::DEFAULT_TOKEN_ARTIFACT));
    }

    #[test]
    fn full_usage() {
        let cli = Cli::try_parse_from([
            "dex-order",
            "--rpc-url",
            "http://10.0.0.1:8545",
            "--from",
            "0x5409ed021d9299bf6814279a6a1411a7e866a631",
            "--pk",
            "0xf2f48ee19680706196e2e339e5da3491186e0c4c5030670656b0e0164837257d",
            "--maker-token",
            "0x34d402f14d58e001d8efbe6585051bf9706aa064",
            "--taker-token",
            "0x25b8fe1de9daf8ba351890744ff28cf7dfa8f5e3",
            "--salt",
            "42",
            "--expiration",
            "1600000000",
            "--signature-type",
            "eip712",
            "--format",
            "table",
        ])
        .unwrap();
        assert_eq!(cli.rpc_url, "http://10.0.0.1:8545");
        assert!(cli.pk.is_some());
        assert_eq!(cli.maker_token, Some(address!("0x34d402f14d58e001d8efbe6585051bf9706aa064")));
        assert_eq!(cli.taker_token, Some(address!("0x25b8fe1de9daf8ba351890744ff28cf7dfa8f5e3")));
        assert_eq!(cli.salt, Some(U256::from(42)));
        assert_eq!(cli.expiration, Some(1_600_000_000));
        assert_eq!(cli.signature_type, SignatureType::Eip712);
        assert_eq!(cli.format, OutputFormat::Table);
    }

    #[test]
    fn malformed_address_is_rejected() {
        let err = Cli::try_parse_from(["dex-order", "--from", "0x1234"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn private_key_is_not_validated_when_parsing() {
        let cli = Cli::try_parse_from([
            "dex-order",
            "--from",
            "0x5409ed021d9299bf6814279a6a1411a7e866a631",
            "--pk",
            "garbage",
        ])
        .unwrap();
        assert_eq!(cli.pk.as_deref(), Some("garbage"));
    }
}
