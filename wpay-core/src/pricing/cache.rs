use crate::storage::{KeyValueStore, StorageError, read_json, write_json};
use crate::utils::clock::Clock;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use wpay_sdk::objects::SimplePriceResponse;

pub const PRICE_CACHE_KEY_PREFIX: &str = "price_";
pub const DEFAULT_PRICE_TTL: Duration = Duration::from_secs(30);

/// What is stored under a price key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRates {
    pub data: SimplePriceResponse,
    /// Milliseconds since the Unix epoch at fetch time.
    pub timestamp: i64,
}

/// Storage key for a set of price-source ids.
///
/// Ids are lower-cased, de-duplicated and sorted, so the same set always
/// maps to the same key regardless of request order.
pub fn cache_key<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = ids
        .into_iter()
        .map(|id| id.as_ref().trim().to_ascii_lowercase())
        .filter(|id| !id.is_empty())
        .sorted()
        .dedup()
        .join(",");
    format!("{PRICE_CACHE_KEY_PREFIX}{joined}")
}

/// Time-bounded cache of spot prices.
///
/// Expired entries are evicted when they are read. Storage failures never
/// surface to callers: a failed read is a miss and a failed write is
/// logged and dropped.
#[derive(Clone)]
pub struct PriceCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl: DEFAULT_PRICE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get<S: AsRef<str>>(&self, ids: &[S]) -> Option<SimplePriceResponse> {
        let key = cache_key(ids);
        let cached = match read_json::<CachedRates>(self.store.as_ref(), &key).await {
            Ok(Some(cached)) => cached,
            Ok(None) => return None,
            Err(StorageError::Corrupt { source, .. }) => {
                warn!(key = %key, error = %source, "Ignoring corrupt price cache entry");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Price cache read failed");
                return None;
            }
        };

        let age_ms = self.clock.unix_millis().saturating_sub(cached.timestamp);
        if age_ms < self.ttl.as_millis() as i64 {
            debug!(key = %key, age_ms, "Price cache hit");
            return Some(cached.data);
        }

        debug!(key = %key, age_ms, "Price cache entry expired");
        if let Err(e) = self.store.evict(&key).await {
            warn!(key = %key, error = %e, "Failed to evict expired price cache entry");
        }
        None
    }

    pub async fn put<S: AsRef<str>>(&self, ids: &[S], rates: &SimplePriceResponse) {
        let key = cache_key(ids);
        let entry = CachedRates {
            data: rates.clone(),
            timestamp: self.clock.unix_millis(),
        };
        if let Err(e) = write_json(self.store.as_ref(), &key, &entry).await {
            warn!(key = %key, error = %e, "Failed to write price cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::utils::clock::ManualClock;
    use wpay_sdk::objects::UsdQuote;

    fn rates(id: &str, usd: f64) -> SimplePriceResponse {
        let mut rates = SimplePriceResponse::new();
        rates.insert(id.to_string(), UsdQuote { usd });
        rates
    }

    #[test]
    fn test_key_ignores_order_and_case() {
        assert_eq!(cache_key(["ethereum", "bitcoin"]), "price_bitcoin,ethereum");
        assert_eq!(cache_key(["Bitcoin", "ethereum", "bitcoin"]), "price_bitcoin,ethereum");
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_millis(1_000_000));
        let cache = PriceCache::new(store.clone(), clock.clone());

        cache.put(&["ethereum"], &rates("ethereum", 2000.0)).await;
        clock.advance(Duration::from_secs(29));
        assert_eq!(cache.get(&["ethereum"]).await, Some(rates("ethereum", 2000.0)));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&["ethereum"]).await, None);
        // expired entries are evicted on read
        assert_eq!(store.read("price_ethereum").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store
            .write("price_ethereum", "definitely not json".to_string())
            .await
            .unwrap();
        let cache = PriceCache::new(store, Arc::new(ManualClock::default()));
        assert_eq!(cache.get(&["ethereum"]).await, None);
    }

    #[tokio::test]
    async fn test_lookup_is_order_independent() {
        let cache = PriceCache::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::default()),
        );
        let mut both = rates("ethereum", 2000.0);
        both.extend(rates("bitcoin", 60000.0));
        cache.put(&["ethereum", "bitcoin"], &both).await;
        assert_eq!(cache.get(&["bitcoin", "ethereum"]).await, Some(both));
    }
}
