//! Runtime configuration shared across crates.
//!
//! These are validated values. Parsing the TOML file and applying CLI
//! overrides is done by the server crate.

mod config_store;

pub use config_store::ConfigStore;

use std::time::Duration;
use url::Url;
use wpay_sdk::objects::AppMetadata;

/// Checkout behaviour. Reloadable at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// How far in the future the `expiry` of a payment request lies.
    pub request_ttl: Duration,
    /// Pause between a confirmed payment and clearing the cart.
    pub success_delay: Duration,
    /// Keep the wallet provider alive between attempts.
    pub reuse_provider: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            request_ttl: Duration::from_secs(600),
            success_delay: Duration::from_millis(1500),
            reuse_provider: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub base_url: Url,
    /// Sent as `x-cg-demo-api-key` when present.
    pub api_key: Option<String>,
    pub cache_ttl: Duration,
}

/// Connection settings of the wallet relay.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub relay_url: Url,
    pub project_id: String,
    pub metadata: AppMetadata,
    /// CAIP-2 chains offered in the `eip155` namespace.
    pub chains: Vec<String>,
}

impl WalletConfig {
    pub fn default_chains() -> Vec<String> {
        vec!["eip155:1".to_string(), "eip155:11155111".to_string()]
    }
}
