//! 0x v3 orders and their signing.
//!
//! An [`Order`] is hashed as an EIP-712 struct under the domain
//! `{name: "0x Protocol", version: "3.0.0", chainId, verifyingContract:
//! exchange}`, which binds a signature to a single exchange deployment on a
//! single chain.
//!
//! [`OrderFactory`] fills the fixed fields of every order it produces, while
//! the only fields that vary between orders, salt and expiration, are
//! passed explicitly. Use [`random_salt`] and [`default_expiration`] for
//! the usual defaults, or pin them to get reproducible signatures.

use std::{fmt::Display, str::FromStr};

use alloy::{
    primitives::{Address, B256, Bytes, Signature, U256},
    signers::{Signer, local::PrivateKeySigner},
};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{abi, asset_data, error::OrderError, provider};

/// EIP-712 domain name of the 0x v3 exchange.
pub const EIP712_DOMAIN_NAME: &str = "0x Protocol";

/// EIP-712 domain version of the 0x v3 exchange.
pub const EIP712_DOMAIN_VERSION: &str = "3.0.0";

/// Lifetime of an order unless its expiration is pinned: 10 days.
pub const DEFAULT_ORDER_TTL_SECS: u64 = 60 * 60 * 24 * 10;

/// Length of a 0x ECDSA signature: `v ++ r ++ s ++ signature type`.
pub const SIGNATURE_LEN: usize = 66;

/// How the order hash is signed, encoded as the trailing signature byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureType {
    /// Order hash signed directly.
    Eip712,
    /// Order hash signed as an `eth_sign` personal message.
    #[default]
    EthSign,
}

impl SignatureType {
    /// 0x signature type ID.
    pub fn id(&self) -> u8 {
        match self {
            SignatureType::Eip712 => 2,
            SignatureType::EthSign => 3,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            2 => Some(SignatureType::Eip712),
            3 => Some(SignatureType::EthSign),
            _ => None,
        }
    }
}

impl Display for SignatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureType::Eip712 => write!(f, "eip712"),
            SignatureType::EthSign => write!(f, "eth-sign"),
        }
    }
}

impl FromStr for SignatureType {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eip712" => Ok(SignatureType::Eip712),
            "eth-sign" | "ethsign" => Ok(SignatureType::EthSign),
            _ => Err(OrderError::InvalidArgument(format!("unknown signature type: {}", s))),
        }
    }
}

/// Unsigned 0x v3 order.
///
/// Amounts are base units of the respective assets.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Debug)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub chain_id: u64,
    pub exchange_address: Address,
    pub maker_address: Address,
    pub taker_address: Address,
    pub fee_recipient_address: Address,
    pub sender_address: Address,
    #[serde(with = "u256_dec")]
    #[debug("{maker_asset_amount}")]
    pub maker_asset_amount: U256,
    #[serde(with = "u256_dec")]
    #[debug("{taker_asset_amount}")]
    pub taker_asset_amount: U256,
    #[serde(with = "u256_dec")]
    #[debug("{maker_fee}")]
    pub maker_fee: U256,
    #[serde(with = "u256_dec")]
    #[debug("{taker_fee}")]
    pub taker_fee: U256,
    #[serde(with = "u256_dec")]
    #[debug("{expiration_time_seconds}")]
    pub expiration_time_seconds: U256,
    #[serde(with = "u256_dec")]
    #[debug("{salt}")]
    pub salt: U256,
    pub maker_asset_data: Bytes,
    pub taker_asset_data: Bytes,
    pub maker_fee_asset_data: Bytes,
    pub taker_fee_asset_data: Bytes,
}

impl Order {
    /// EIP-712 domain binding the order to its exchange and chain.
    pub fn domain(&self) -> Eip712Domain {
        eip712_domain! {
            name: EIP712_DOMAIN_NAME,
            version: EIP712_DOMAIN_VERSION,
            chain_id: self.chain_id,
            verifying_contract: self.exchange_address,
        }
    }

    /// Order hash as computed by the exchange.
    pub fn hash(&self) -> B256 { self.to_sol().eip712_signing_hash(&self.domain()) }

    fn to_sol(&self) -> abi::Order {
        abi::Order {
            makerAddress: self.maker_address,
            takerAddress: self.taker_address,
            feeRecipientAddress: self.fee_recipient_address,
            senderAddress: self.sender_address,
            makerAssetAmount: self.maker_asset_amount,
            takerAssetAmount: self.taker_asset_amount,
            makerFee: self.maker_fee,
            takerFee: self.taker_fee,
            expirationTimeSeconds: self.expiration_time_seconds,
            salt: self.salt,
            makerAssetData: self.maker_asset_data.clone(),
            takerAssetData: self.taker_asset_data.clone(),
            makerFeeAssetData: self.maker_fee_asset_data.clone(),
            takerFeeAssetData: self.taker_fee_asset_data.clone(),
        }
    }
}

/// Order with the maker's signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub signature: Bytes,
}

impl SignedOrder {
    pub fn signature_type(&self) -> Option<SignatureType> {
        self.signature.last().copied().and_then(SignatureType::from_id)
    }

    /// Address that produced the signature.
    pub fn recover_signer(&self) -> Result<Address, OrderError> {
        if self.signature.len() != SIGNATURE_LEN {
            return Err(OrderError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LEN,
                self.signature.len()
            )));
        }
        let signature_type = self.signature_type().ok_or_else(|| {
            OrderError::InvalidSignature(format!(
                "unsupported signature type {}",
                self.signature[SIGNATURE_LEN - 1]
            ))
        })?;
        let y_parity = match self.signature[0] {
            27 => false,
            28 => true,
            v => return Err(OrderError::InvalidSignature(format!("invalid v {}", v))),
        };
        let signature = Signature::new(
            U256::from_be_slice(&self.signature[1..33]),
            U256::from_be_slice(&self.signature[33..65]),
            y_parity,
        );

        let hash = self.order.hash();
        match signature_type {
            SignatureType::Eip712 => signature.recover_address_from_prehash(&hash),
            SignatureType::EthSign => signature.recover_address_from_msg(hash),
        }
        .map_err(|err| OrderError::InvalidSignature(err.to_string()))
    }
}

/// Encodes an ECDSA signature in 0x layout.
fn encode_signature(signature: &Signature, signature_type: SignatureType) -> Bytes {
    let mut bytes = Vec::with_capacity(SIGNATURE_LEN);
    bytes.push(27 + signature.v() as u8);
    bytes.extend_from_slice(&signature.r().to_be_bytes::<32>());
    bytes.extend_from_slice(&signature.s().to_be_bytes::<32>());
    bytes.push(signature_type.id());
    bytes.into()
}

/// Fields shared by every order of an [`OrderFactory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderDefaults {
    pub chain_id: u64,
    pub exchange_address: Address,
    pub maker_address: Address,
    pub taker_address: Address,
    pub fee_recipient_address: Address,
    pub sender_address: Address,
    pub maker_asset_amount: U256,
    pub taker_asset_amount: U256,
    pub maker_fee: U256,
    pub taker_fee: U256,
    pub maker_asset_data: Bytes,
    pub taker_asset_data: Bytes,
    pub maker_fee_asset_data: Bytes,
    pub taker_fee_asset_data: Bytes,
}

impl OrderDefaults {
    /// One base unit of `maker_token` for one base unit of `taker_token`,
    /// open to any taker, without fees.
    pub fn erc20_pair(
        chain_id: u64,
        exchange_address: Address,
        maker_address: Address,
        maker_token: Address,
        taker_token: Address,
    ) -> Self {
        Self {
            chain_id,
            exchange_address,
            maker_address,
            taker_address: Address::ZERO,
            fee_recipient_address: Address::ZERO,
            sender_address: Address::ZERO,
            maker_asset_amount: U256::from(1),
            taker_asset_amount: U256::from(1),
            maker_fee: U256::ZERO,
            taker_fee: U256::ZERO,
            maker_asset_data: asset_data::encode_erc20(maker_token),
            taker_asset_data: asset_data::encode_erc20(taker_token),
            maker_fee_asset_data: Bytes::new(),
            taker_fee_asset_data: Bytes::new(),
        }
    }
}

/// Produces orders from fixed defaults, signed by the maker key.
#[derive(Clone, derive_more::Debug)]
pub struct OrderFactory {
    #[debug("{}", signer.address())]
    signer: PrivateKeySigner,
    defaults: OrderDefaults,
    signature_type: SignatureType,
}

impl OrderFactory {
    pub fn new(signer: PrivateKeySigner, defaults: OrderDefaults) -> Self {
        Self { signer, defaults, signature_type: SignatureType::default() }
    }

    /// Factory signing with the hex-encoded key, which must be present.
    pub fn from_private_key(
        private_key: Option<&str>,
        defaults: OrderDefaults,
    ) -> Result<Self, OrderError> {
        let signer = provider::optional_signer(private_key)?.ok_or(OrderError::MissingPrivateKey)?;
        Ok(Self::new(signer, defaults))
    }

    pub fn with_signature_type(self, signature_type: SignatureType) -> Self {
        Self { signature_type, ..self }
    }

    /// Address of the signing key.
    pub fn signer(&self) -> Address { self.signer.address() }

    pub fn defaults(&self) -> &OrderDefaults { &self.defaults }

    /// Unsigned order with the given expiration and salt.
    pub fn new_order(&self, expiration_time_seconds: U256, salt: U256) -> Order {
        let d = &self.defaults;
        Order {
            chain_id: d.chain_id,
            exchange_address: d.exchange_address,
            maker_address: d.maker_address,
            taker_address: d.taker_address,
            fee_recipient_address: d.fee_recipient_address,
            sender_address: d.sender_address,
            maker_asset_amount: d.maker_asset_amount,
            taker_asset_amount: d.taker_asset_amount,
            maker_fee: d.maker_fee,
            taker_fee: d.taker_fee,
            expiration_time_seconds,
            salt,
            maker_asset_data: d.maker_asset_data.clone(),
            taker_asset_data: d.taker_asset_data.clone(),
            maker_fee_asset_data: d.maker_fee_asset_data.clone(),
            taker_fee_asset_data: d.taker_fee_asset_data.clone(),
        }
    }

    /// Signs an order with the given expiration and salt.
    pub async fn new_signed_order(
        &self,
        expiration_time_seconds: U256,
        salt: U256,
    ) -> Result<SignedOrder, OrderError> {
        self.sign(self.new_order(expiration_time_seconds, salt)).await
    }

    pub async fn sign(&self, order: Order) -> Result<SignedOrder, OrderError> {
        let hash = order.hash();
        let signature = match self.signature_type {
            SignatureType::Eip712 => self.signer.sign_hash(&hash).await?,
            SignatureType::EthSign => self.signer.sign_message(hash.as_slice()).await?,
        };
        debug!(order_hash = %hash, signature_type = %self.signature_type, "order signed");
        Ok(SignedOrder { order, signature: encode_signature(&signature, self.signature_type) })
    }
}

/// Random 256-bit order salt.
pub fn random_salt() -> U256 { U256::from_be_bytes(rand::random::<[u8; 32]>()) }

/// Expiration [`DEFAULT_ORDER_TTL_SECS`] after the given block timestamp.
pub fn default_expiration(block_timestamp: u64) -> U256 {
    U256::from(block_timestamp) + U256::from(DEFAULT_ORDER_TTL_SECS)
}

/// `U256` as a decimal string, the way 0x tooling represents amounts.
mod u256_dec {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(D::Error::custom)
    }
}

#[cfg(feature = "display")]
impl Display for SignedOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use colored::Colorize;
        use tabled::{Table, Tabled, settings::Style};

        #[derive(Tabled)]
        struct Field {
            #[tabled(rename = "Field")]
            name: &'static str,
            #[tabled(rename = "Value")]
            value: String,
        }

        let asset = |data: &Bytes| match asset_data::decode_erc20(data) {
            Ok(token) => format!("ERC20 {}", token),
            Err(_) if data.is_empty() => "-".to_string(),
            Err(_) => data.to_string(),
        };
        let expiration = u64::try_from(self.order.expiration_time_seconds)
            .ok()
            .and_then(|ts| i64::try_from(ts).ok())
            .and_then(|ts| chrono::DateTime::<chrono::Utc>::from_timestamp(ts, 0))
            .map(|ts| {
                format!("{} ({})", self.order.expiration_time_seconds, ts.format("%Y-%m-%d %H:%M:%S"))
            })
            .unwrap_or_else(|| self.order.expiration_time_seconds.to_string());

        let o = &self.order;
        let fields = vec![
            Field { name: "Chain ID", value: o.chain_id.to_string() },
            Field { name: "Exchange", value: o.exchange_address.to_string() },
            Field { name: "Maker", value: o.maker_address.to_string() },
            Field { name: "Taker", value: o.taker_address.to_string() },
            Field { name: "Fee Recipient", value: o.fee_recipient_address.to_string() },
            Field { name: "Sender", value: o.sender_address.to_string() },
            Field { name: "Maker Asset", value: asset(&o.maker_asset_data) },
            Field { name: "Maker Amount", value: o.maker_asset_amount.to_string() },
            Field { name: "Taker Asset", value: asset(&o.taker_asset_data) },
            Field { name: "Taker Amount", value: o.taker_asset_amount.to_string() },
            Field { name: "Maker Fee", value: format!("{} {}", o.maker_fee, asset(&o.maker_fee_asset_data)) },
            Field { name: "Taker Fee", value: format!("{} {}", o.taker_fee, asset(&o.taker_fee_asset_data)) },
            Field { name: "Expiration", value: expiration },
            Field { name: "Salt", value: o.salt.to_string() },
            Field {
                name: "Signature",
                value: format!(
                    "{} ({})",
                    self.signature,
                    self.signature_type().map(|t| t.to_string()).unwrap_or_else(|| "?".into())
                ),
            },
        ];

        writeln!(f, "{}", format!("Order {}", o.hash()).bold().purple())?;
        let mut table = Table::new(fields);
        table.with(Style::sharp());
        table.fmt(f)
    }
}
