use anyhow::Context;
use dex_order_sdk::order::SignedOrder;

use crate::args::OutputFormat;

pub(crate) fn print(order: &SignedOrder, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render(order, format)?);
    Ok(())
}

fn render(order: &SignedOrder, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(order).context("serializing order"),
        OutputFormat::Table => Ok(order.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, Bytes, U256};
    use dex_order_sdk::order::{Order, OrderDefaults};

    use super::*;

    fn signed_order() -> SignedOrder {
        let defaults = OrderDefaults::erc20_pair(
            1337,
            Address::repeat_byte(0xee),
            Address::repeat_byte(0x54),
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
        );
        let order = Order {
            chain_id: defaults.chain_id,
            exchange_address: defaults.exchange_address,
            maker_address: defaults.maker_address,
            taker_address: defaults.taker_address,
            fee_recipient_address: defaults.fee_recipient_address,
            sender_address: defaults.sender_address,
            maker_asset_amount: defaults.maker_asset_amount,
            taker_asset_amount: defaults.taker_asset_amount,
            maker_fee: defaults.maker_fee,
            taker_fee: defaults.taker_fee,
            expiration_time_seconds: U256::from(1_600_000_000u64),
            salt: U256::from(5),
            maker_asset_data: defaults.maker_asset_data,
            taker_asset_data: defaults.taker_asset_data,
            maker_fee_asset_data: defaults.maker_fee_asset_data,
            taker_fee_asset_data: defaults.taker_fee_asset_data,
        };
        SignedOrder { order, signature: Bytes::from(vec![0x1b; 66]) }
    }

    #[test]
    fn json_is_parseable() {
        let json = render(&signed_order(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["makerAssetAmount"], "1");
        assert_eq!(value["takerFee"], "0");
        assert_eq!(value["salt"], "5");
        assert!(value["signature"].is_string());
    }

    #[test]
    fn table_lists_fields() {
        let table = render(&signed_order(), OutputFormat::Table).unwrap();
        for field in ["Chain ID", "Maker Asset", "Taker Amount", "Expiration", "Signature"] {
            assert!(table.contains(field), "missing {field}");
        }
        assert!(table.contains("2020-09-13"));
    }
}
