//! TOML file configuration structures.
//!
//! These structs directly map to the `wpay-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "127.0.0.1:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

/// Where the cart, settings and price cache are persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the JSON files. Omit to keep everything in memory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Rate source section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_pricing_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_url: default_pricing_url(),
            api_key: None,
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_pricing_url() -> String {
    wpay_core::pricing::DEFAULT_COINGECKO_URL.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    30
}

/// Wallet relay and dapp metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub relay_url: String,
    pub project_id: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_description")]
    pub app_description: String,
    #[serde(default = "default_app_url")]
    pub app_url: String,
    #[serde(default)]
    pub app_icons: Vec<String>,
    #[serde(default = "default_chains")]
    pub chains: Vec<String>,
    /// Keep the wallet provider between checkout attempts.
    #[serde(default = "default_true")]
    pub reuse_provider: bool,
}

fn default_app_name() -> String {
    "WalletPay Store".to_string()
}

fn default_app_description() -> String {
    "Storefront checkout with wallet payments".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_chains() -> Vec<String> {
    wpay_core::config::WalletConfig::default_chains()
}

fn default_true() -> bool {
    true
}

/// Checkout timing. Reloaded on SIGHUP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default = "default_request_ttl_secs")]
    pub request_ttl_secs: u64,
    #[serde(default = "default_success_delay_ms")]
    pub success_delay_ms: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            request_ttl_secs: default_request_ttl_secs(),
            success_delay_ms: default_success_delay_ms(),
        }
    }
}

fn default_request_ttl_secs() -> u64 {
    600
}

fn default_success_delay_ms() -> u64 {
    1500
}
