//! 0x asset data: `bytes4 proxy id ++ abi-encoded asset parameters`.
//!
//! For ERC-20 tokens the proxy id is `bytes4(keccak256("ERC20Token(address)"))`
//! followed by the token address left-padded to 32 bytes, 36 bytes in total.

use alloy::primitives::{Address, Bytes};
use alloy_sol_types::SolCall;

use crate::{abi::IAssetData::ERC20TokenCall, error::OrderError};

/// Asset proxy ID of the ERC-20 proxy.
pub const ERC20_PROXY_ID: [u8; 4] = ERC20TokenCall::SELECTOR;

/// Length of ERC-20 asset data in bytes.
pub const ERC20_ASSET_DATA_LEN: usize = 4 + 32;

/// Encodes ERC-20 asset data for the token.
pub fn encode_erc20(token: Address) -> Bytes {
    ERC20TokenCall { tokenAddress: token }.abi_encode().into()
}

/// Decodes the token address out of ERC-20 asset data.
pub fn decode_erc20(asset_data: &[u8]) -> Result<Address, OrderError> {
    if asset_data.len() != ERC20_ASSET_DATA_LEN {
        return Err(OrderError::InvalidAssetData(format!(
            "expected {} bytes of ERC-20 asset data, got {}",
            ERC20_ASSET_DATA_LEN,
            asset_data.len()
        )));
    }
    if asset_data[..4] != ERC20_PROXY_ID {
        return Err(OrderError::InvalidAssetData(format!(
            "unsupported asset proxy id 0x{}",
            alloy::hex::encode(&asset_data[..4])
        )));
    }
    if asset_data[4..16].iter().any(|b| *b != 0) {
        return Err(OrderError::InvalidAssetData("address is not zero-padded".to_string()));
    }
    ERC20TokenCall::abi_decode_validate(asset_data)
        .map(|call| call.tokenAddress)
        .map_err(|err| OrderError::InvalidAssetData(err.to_string()))
}
