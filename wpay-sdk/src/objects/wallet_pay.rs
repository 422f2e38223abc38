//! The `wallet_pay` request and the signer-session shapes it travels in.
//!
//! A [`WalletPayRequest`] rides along a connection proposal as the
//! `walletPay` extension. When the wallet approves the connection, the
//! resulting [`Session`] carries `pendingRequests` and
//! `pendingRequestsResults` as two arrays indexed in parallel.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Method name of the payment request inside a session.
pub const WALLET_PAY_METHOD: &str = "wallet_pay";

/// Protocol version sent in every request.
pub const WALLET_PAY_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPayRequest {
    pub version: CompactString,
    pub order_id: String,
    pub accepted_payments: Vec<AcceptedPayment>,
    /// Unix timestamp (seconds). Advisory; interpreted by the wallet.
    pub expiry: i64,
}

/// One way the buyer may settle the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedPayment {
    /// CAIP-10 account id of the merchant.
    pub recipient: String,
    /// CAIP-19 asset id.
    pub asset: String,
    /// `0x`-prefixed hex amount in the asset's smallest unit.
    pub amount: String,
}

/// Capabilities requested for one namespace (e.g. `eip155`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    pub chains: Vec<String>,
    pub methods: Vec<String>,
    pub events: Vec<String>,
}

impl NamespaceConfig {
    /// The EVM capability set used for payments. Always includes `wallet_pay`.
    pub fn eip155(chains: Vec<String>) -> Self {
        Self {
            chains,
            methods: vec![
                "eth_sendTransaction".to_string(),
                "eth_sign".to_string(),
                "personal_sign".to_string(),
                WALLET_PAY_METHOD.to_string(),
            ],
            events: vec![
                "eth_sendTransaction".to_string(),
                "personal_sign".to_string(),
            ],
        }
    }
}

/// Dapp metadata shown by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub icons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// An approved connection between the storefront and a wallet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub topic: String,
    #[serde(default)]
    pub namespaces: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub pending_requests: Vec<PendingRequest>,
    #[serde(default)]
    pub pending_requests_results: Vec<Option<serde_json::Value>>,
}

impl Session {
    /// Position of the first pending request with the given method.
    pub fn pending_request_index(&self, method: &str) -> Option<usize> {
        self.pending_requests.iter().position(|r| r.method == method)
    }

    /// Result recorded for the first pending request with the given method.
    pub fn pending_request_result(&self, method: &str) -> Option<&serde_json::Value> {
        let index = self.pending_request_index(method)?;
        self.pending_requests_results.get(index)?.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wallet_pay_request_wire_shape() {
        let request = WalletPayRequest {
            version: WALLET_PAY_VERSION.into(),
            order_id: "order-1".to_string(),
            accepted_payments: vec![AcceptedPayment {
                recipient: "eip155:8453:0xabc".to_string(),
                asset: "eip155:8453/slip44:60".to_string(),
                amount: "0xb1a2bc2ec50000".to_string(),
            }],
            expiry: 1_700_000_000,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["orderId"], "order-1");
        assert_eq!(value["acceptedPayments"][0]["amount"], "0xb1a2bc2ec50000");
    }

    #[test]
    fn test_session_parses_parallel_arrays() {
        let session: Session = serde_json::from_value(json!({
            "topic": "abc",
            "pendingRequests": [
                {"id": 1, "method": "wallet_pay", "params": {}},
                {"id": 2, "method": "personal_sign"}
            ],
            "pendingRequestsResults": [{"txid": "0x01"}, null]
        }))
        .unwrap();
        assert_eq!(session.pending_request_index(WALLET_PAY_METHOD), Some(0));
        assert!(session.pending_request_result(WALLET_PAY_METHOD).is_some());
        assert!(session.pending_request_result("personal_sign").is_none());
    }
}
