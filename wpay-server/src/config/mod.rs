//! Configuration module for wpay-server.
//!
//! Handles loading configuration from TOML files and CLI arguments and
//! turning it into the runtime config types of `wpay-core`.

pub mod file;

use crate::config::file::{
    CheckoutConfig as FileCheckoutConfig, FileConfig, PricingConfig as FilePricingConfig,
    WalletConfig as FileWalletConfig,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;
use wpay_core::config::{CheckoutConfig, PricingConfig, WalletConfig};
use wpay_sdk::objects::AppMetadata;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid url in {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        source: url::ParseError,
    },

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub storage_path: Option<PathBuf>,
    pub pricing: PricingConfig,
    pub wallet: WalletConfig,
    pub checkout: CheckoutConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;
        self.build_loaded_config(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    ///
    /// Only the checkout section is applied at runtime; the rest is
    /// returned so callers can log what would need a restart.
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.wallet.project_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "wallet.project_id must not be empty".to_string(),
            ));
        }
        if config.wallet.chains.is_empty() {
            return Err(ConfigError::ValidationError(
                "wallet.chains must list at least one chain".to_string(),
            ));
        }
        if let Some(chain) = config
            .wallet
            .chains
            .iter()
            .find(|c| !c.starts_with("eip155:"))
        {
            return Err(ConfigError::ValidationError(format!(
                "wallet chain {chain} is not an eip155 chain"
            )));
        }
        if config.pricing.cache_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "pricing.cache_ttl_secs must be positive".to_string(),
            ));
        }
        if config.checkout.request_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "checkout.request_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn build_loaded_config(&self, file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        let checkout = convert_checkout(&file_config.checkout, file_config.wallet.reuse_provider);
        Ok(LoadedConfig {
            listen: file_config.server.listen,
            storage_path: file_config.storage.path,
            pricing: convert_pricing(file_config.pricing)?,
            wallet: convert_wallet(file_config.wallet)?,
            checkout,
        })
    }
}

fn convert_checkout(c: &FileCheckoutConfig, reuse_provider: bool) -> CheckoutConfig {
    CheckoutConfig {
        request_ttl: Duration::from_secs(c.request_ttl_secs),
        success_delay: Duration::from_millis(c.success_delay_ms),
        reuse_provider,
    }
}

fn convert_pricing(p: FilePricingConfig) -> Result<PricingConfig, ConfigError> {
    let base_url = Url::parse(&p.base_url).map_err(|source| ConfigError::InvalidUrl {
        field: "pricing.base_url",
        source,
    })?;
    Ok(PricingConfig {
        base_url,
        api_key: p.api_key.filter(|k| !k.is_empty()),
        cache_ttl: Duration::from_secs(p.cache_ttl_secs),
    })
}

fn convert_wallet(w: FileWalletConfig) -> Result<WalletConfig, ConfigError> {
    let relay_url = Url::parse(&w.relay_url).map_err(|source| ConfigError::InvalidUrl {
        field: "wallet.relay_url",
        source,
    })?;
    if !matches!(relay_url.scheme(), "ws" | "wss") {
        return Err(ConfigError::ValidationError(format!(
            "wallet.relay_url must use ws or wss, got {}",
            relay_url.scheme()
        )));
    }
    Ok(WalletConfig {
        relay_url,
        project_id: w.project_id,
        metadata: AppMetadata {
            name: w.app_name,
            description: w.app_description,
            url: w.app_url,
            icons: w.app_icons,
        },
        chains: w.chains,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const VALID: &str = r#"
[wallet]
relay_url = "wss://relay.example.com"
project_id = "project-123"
reuse_provider = false

[pricing]
api_key = ""

[checkout]
request_ttl_secs = 60
success_delay_ms = 250
"#;

    #[test]
    fn test_load_builds_runtime_config() {
        let file = write_config(VALID);
        let loaded = ConfigLoader::new(file.path(), None).load().unwrap();

        assert_eq!(loaded.listen.port(), 8080);
        assert_eq!(loaded.wallet.metadata.name, "WalletPay Store");
        assert_eq!(loaded.wallet.relay_url.as_str(), "wss://relay.example.com/");
        assert_eq!(loaded.pricing.api_key, None);
        assert_eq!(loaded.pricing.cache_ttl, Duration::from_secs(30));
        assert_eq!(
            loaded.checkout,
            CheckoutConfig {
                request_ttl: Duration::from_secs(60),
                success_delay: Duration::from_millis(250),
                reuse_provider: false,
            }
        );
    }

    #[test]
    fn test_listen_override_wins() {
        let file = write_config(VALID);
        let listen: SocketAddr = "0.0.0.0:9999".parse().unwrap();
        let loaded = ConfigLoader::new(file.path(), Some(listen)).load().unwrap();
        assert_eq!(loaded.listen, listen);
    }

    #[test]
    fn test_rejects_non_websocket_relay() {
        let file = write_config(
            r#"
[wallet]
relay_url = "https://relay.example.com"
project_id = "project-123"
"#,
        );
        let err = ConfigLoader::new(file.path(), None).load().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_rejects_empty_project_and_foreign_chains() {
        let file = write_config(
            r#"
[wallet]
relay_url = "wss://relay.example.com"
project_id = "  "
"#,
        );
        assert!(ConfigLoader::new(file.path(), None).load().is_err());

        let file = write_config(
            r#"
[wallet]
relay_url = "wss://relay.example.com"
project_id = "p"
chains = ["solana:mainnet"]
"#,
        );
        let err = ConfigLoader::new(file.path(), None).load().unwrap_err();
        assert!(err.to_string().contains("solana:mainnet"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ConfigLoader::new("/nonexistent/wpay-config.toml", None)
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
