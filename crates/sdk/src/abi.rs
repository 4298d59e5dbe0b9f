//! Solidity bindings for the 0x v3 order schema, ERC-20 asset data and the
//! dummy token contract.

use alloy::sol;

sol! {
    /// 0x v3 order as hashed under EIP-712.
    ///
    /// Field names and order must match the exchange's `Order` type string
    /// exactly, otherwise the order hash diverges from the one computed
    /// on-chain.
    struct Order {
        address makerAddress;
        address takerAddress;
        address feeRecipientAddress;
        address senderAddress;
        uint256 makerAssetAmount;
        uint256 takerAssetAmount;
        uint256 makerFee;
        uint256 takerFee;
        uint256 expirationTimeSeconds;
        uint256 salt;
        bytes makerAssetData;
        bytes takerAssetData;
        bytes makerFeeAssetData;
        bytes takerFeeAssetData;
    }

    /// Asset data layouts understood by the asset proxies.
    ///
    /// Never called on-chain, only used for the `selector ++ abi(args)`
    /// encoding.
    interface IAssetData {
        function ERC20Token(address tokenAddress) external;
    }

    /// Mintable ERC-20 used for testing.
    #[sol(rpc)]
    contract DummyERC20Token {
        constructor(string _name, string _symbol, uint256 _decimals, uint256 _totalSupply);

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint256);
        function totalSupply() external view returns (uint256);
    }
}
