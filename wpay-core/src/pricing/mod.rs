//! USD to crypto conversion.
//!
//! [`ConversionService`] answers "how much of asset X is this USD amount"
//! using a [`RateSource`] for spot prices and a [`PriceCache`] in front of
//! it so repeated quotes within the TTL do not hit the network.

mod cache;
mod conversion;
mod source;

pub use cache::{CachedRates, DEFAULT_PRICE_TTL, PRICE_CACHE_KEY_PREFIX, PriceCache, cache_key};
pub use conversion::{ConversionResult, ConversionService, ConvertUsd, price_source_id};
pub use source::{CoinGeckoSource, DEFAULT_COINGECKO_URL, RateSource, RateSourceError};
