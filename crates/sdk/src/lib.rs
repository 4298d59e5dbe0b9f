//! [`0x`] v3 order SDK.
//!
//! # Overview
//!
//! Builds and signs 0x v3 limit orders over a pair of ERC-20 tokens, optionally
//! deploying the tokens first.
//!
//! Use [`provider::connect`] to build the provider chain, [`provider::resolve_chain`]
//! to learn the chain and its well-known [`ContractAddresses`], then
//! [`token::TokenProvisioner`] to bind or deploy maker/taker tokens and
//! [`order::OrderFactory`] to produce a [`order::SignedOrder`].
//!
//! # Limitations/follow-ups
//!
//! * Only ERC-20 asset data is supported.
//!
//! * Deployment bytecode is not bundled, it is read from a compiled
//!   `DummyERC20Token` artifact, see [`artifact::TokenArtifact`].
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `display` | yes | Enables [`std::fmt::Display`] implementation for [`order::SignedOrder`]. |
//!
//! [`0x`]: https://github.com/0xProject/0x-protocol-specification/blob/master/v3/v3-specification.md

pub mod abi;
pub mod artifact;
pub mod asset_data;
pub mod error;
pub mod order;
pub mod provider;
pub mod token;

use alloy::primitives::{Address, address};

use crate::error::OrderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Well-known 0x v3 protocol contracts deployed on a chain.
pub struct ContractAddresses {
    chain_id: u64,
    exchange: Address,
}

impl ContractAddresses {
    /// Ethereum mainnet.
    pub fn mainnet() -> Self {
        Self { chain_id: 1, exchange: address!("0x61935cbdd02287b511119ddb11aeb42f1593b7ef") }
    }

    /// Ropsten testnet.
    pub fn ropsten() -> Self {
        Self { chain_id: 3, exchange: address!("0xfb2dd2a1366de37f7241c83d47da58fd503e2c64") }
    }

    /// Rinkeby testnet.
    pub fn rinkeby() -> Self {
        Self { chain_id: 4, exchange: address!("0x198805e9682fceec29413059b68550f92868c129") }
    }

    /// Kovan testnet.
    pub fn kovan() -> Self {
        Self { chain_id: 42, exchange: address!("0x4eacd0af335451709e1e7b570b8ea68edec8bc97") }
    }

    /// Local development snapshot (Ganache/Anvil with the 0x migrations
    /// applied).
    pub fn ganache() -> Self {
        Self { chain_id: 1337, exchange: address!("0x48bacb9266a570d521063ef5dd96e61686dbe788") }
    }

    /// Contracts deployed at custom addresses.
    pub fn custom(chain_id: u64, exchange: Address) -> Self { Self { chain_id, exchange } }

    /// Looks up the registry for the chain, failing with
    /// [`OrderError::UnknownChain`] if the protocol is not deployed there.
    pub fn for_chain(chain_id: u64) -> Result<Self, OrderError> {
        match chain_id {
            1 => Ok(Self::mainnet()),
            3 => Ok(Self::ropsten()),
            4 => Ok(Self::rinkeby()),
            42 => Ok(Self::kovan()),
            1337 => Ok(Self::ganache()),
            _ => Err(OrderError::UnknownChain(chain_id)),
        }
    }

    pub fn chain_id(&self) -> u64 { self.chain_id }

    pub fn exchange(&self) -> Address { self.exchange }

    /// Same contracts, but with exchange at a different address.
    pub fn with_exchange(self, exchange: Address) -> Self { Self::custom(self.chain_id, exchange) }
}
