use super::CheckoutError;
use crate::utils::amount::to_base_units_hex;
use rust_decimal::Decimal;
use wpay_sdk::objects::{AcceptedPayment, PaymentAsset, WALLET_PAY_VERSION, WalletPayRequest};

/// CAIP-10 account id of `address` on the asset's chain. Addresses that
/// already carry a chain prefix are kept as-is.
pub fn caip10_recipient(asset: &PaymentAsset, address: &str) -> String {
    let address = address.trim();
    if address.contains(':') {
        address.to_string()
    } else {
        format!("{}:{}", asset.network, address)
    }
}

/// A single-payment request for `amount` units of `asset`.
pub fn build_wallet_pay_request(
    asset: &PaymentAsset,
    recipient: &str,
    amount: Decimal,
    order_id: String,
    expiry: i64,
) -> Result<WalletPayRequest, CheckoutError> {
    let amount = to_base_units_hex(amount, asset.metadata.decimals)
        .map_err(|e| CheckoutError::InvalidAmount(e.to_string()))?;
    Ok(WalletPayRequest {
        version: WALLET_PAY_VERSION.into(),
        order_id,
        accepted_payments: vec![AcceptedPayment {
            recipient: caip10_recipient(asset, recipient),
            asset: asset.caip19(),
            amount,
        }],
        expiry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_usdc_request() {
        let request = build_wallet_pay_request(
            &PaymentAsset::base_usdc(),
            "0xmerchant",
            dec!(100),
            "order-1".to_string(),
            1_700_000_600,
        )
        .unwrap();
        assert_eq!(request.version, "1.0.0");
        assert_eq!(request.accepted_payments.len(), 1);
        let payment = &request.accepted_payments[0];
        assert_eq!(payment.recipient, "eip155:8453:0xmerchant");
        assert_eq!(
            payment.asset,
            "eip155:8453/erc20:0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
        );
        assert_eq!(payment.amount, "0x5f5e100");
    }

    #[test]
    fn test_prefixed_recipient_is_kept() {
        assert_eq!(
            caip10_recipient(&PaymentAsset::base_eth(), " eip155:1:0xabc "),
            "eip155:1:0xabc"
        );
    }
}
