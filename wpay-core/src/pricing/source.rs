use crate::config::PricingConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;
use wpay_sdk::objects::SimplePriceResponse;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3/";

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

#[derive(Debug, Error)]
pub enum RateSourceError {
    #[error("rate source request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("rate source responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed rate source response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid rate source url: {0}")]
    Url(#[from] url::ParseError),
}

/// Spot USD prices keyed by price-source id.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_usd_prices(&self, ids: &[String]) -> Result<SimplePriceResponse, RateSourceError>;
}

/// `GET {base}/simple/price?ids=…&vs_currencies=usd`
#[derive(Debug, Clone)]
pub struct CoinGeckoSource {
    http: Client,
    price_url: Url,
    api_key: Option<String>,
}

impl CoinGeckoSource {
    pub fn new(base_url: Url, api_key: Option<String>) -> Result<Self, RateSourceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(RateSourceError::Request)?;
        Self::with_http_client(http, base_url, api_key)
    }

    pub fn from_config(config: &PricingConfig) -> Result<Self, RateSourceError> {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    pub fn with_http_client(
        http: Client,
        mut base_url: Url,
        api_key: Option<String>,
    ) -> Result<Self, RateSourceError> {
        // `join` replaces the last segment unless the base ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http,
            price_url: base_url.join("simple/price")?,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl RateSource for CoinGeckoSource {
    #[tracing::instrument(skip_all, err, fields(ids = %ids.join(",")), name = "CoinGecko:SimplePrice")]
    async fn fetch_usd_prices(&self, ids: &[String]) -> Result<SimplePriceResponse, RateSourceError> {
        let mut request = self
            .http
            .get(self.price_url.clone())
            .query(&[("ids", ids.join(",").as_str()), ("vs_currencies", "usd")])
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RateSourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rates: SimplePriceResponse = serde_json::from_str(&body)?;
        debug!(returned = rates.len(), "Fetched spot prices");
        Ok(rates)
    }
}
