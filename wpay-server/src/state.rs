//! Application state shared across all request handlers.

use crate::config::LoadedConfig;
use crate::modal::BrowserModal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;
use wpay_core::checkout::{CheckoutOrchestrator, CheckoutServices};
use wpay_core::config::ConfigStore;
use wpay_core::events::session_event_channel;
use wpay_core::pricing::{CoinGeckoSource, ConversionService, PriceCache, RateSourceError};
use wpay_core::storage::KeyValueStore;
use wpay_core::stores::{CartStore, SettingsStore};
use wpay_core::utils::clock::{Clock, SystemClock};
use wpay_core::wallet::{RelayBackend, RelayConfig, SessionOptions};
use wpay_sdk::objects::{AttemptStatus, CheckoutOutcomeView};

/// Finished attempts kept for `GET /checkout/{attempt_id}`.
pub const MAX_FINISHED_ATTEMPTS: usize = 64;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: CheckoutOrchestrator,
    pub modal: Arc<BrowserModal>,
    pub clock: Arc<dyn Clock>,
    /// Running and recently finished attempts. Ids are v7, so iteration
    /// order is start order.
    attempts: Arc<RwLock<BTreeMap<Uuid, AttemptStatus>>>,
    in_flight: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        orchestrator: CheckoutOrchestrator,
        modal: Arc<BrowserModal>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orchestrator,
            modal,
            clock,
            attempts: Arc::new(RwLock::new(BTreeMap::new())),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Wire the checkout services against the relay and the rate source
    /// named in `config`.
    pub async fn from_config(
        config: &LoadedConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, RateSourceError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let (events, _) = session_event_channel();
        let modal = Arc::new(BrowserModal::new(events.clone()));

        let source = CoinGeckoSource::from_config(&config.pricing)?;
        let cache =
            PriceCache::new(store.clone(), clock.clone()).with_ttl(config.pricing.cache_ttl);
        let wallet = RelayBackend::new(RelayConfig::from(&config.wallet), modal.clone());

        let orchestrator = CheckoutOrchestrator::new(CheckoutServices {
            conversion: ConversionService::new(cache, Arc::new(source)),
            cart: CartStore::load(store.clone()).await,
            settings: SettingsStore::load(store).await,
            config: ConfigStore::new(config.checkout.clone()),
            clock: clock.clone(),
            wallet: Arc::new(wallet),
            session_options: SessionOptions::from_config(&config.wallet),
            events,
        });

        Ok(Self::new(orchestrator, modal, clock))
    }

    /// Claim the single checkout slot. Returns `None` if an attempt is
    /// already running. The slot is released when the guard drops.
    pub fn try_begin_attempt(&self) -> Option<AttemptSlot> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| AttemptSlot {
                in_flight: self.in_flight.clone(),
            })
    }

    pub fn attempt_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn record_attempt(&self, status: AttemptStatus) {
        self.attempts.write().await.insert(status.attempt_id, status);
    }

    pub async fn attempt(&self, attempt_id: &Uuid) -> Option<AttemptStatus> {
        self.attempts.read().await.get(attempt_id).cloned()
    }

    /// Store the outcome of `attempt_id` and forget the oldest finished
    /// attempts beyond [`MAX_FINISHED_ATTEMPTS`].
    pub async fn finish_attempt(&self, attempt_id: Uuid, outcome: CheckoutOutcomeView) {
        let mut attempts = self.attempts.write().await;
        if let Some(status) = attempts.get_mut(&attempt_id) {
            status.outcome = Some(outcome);
        }

        let finished: Vec<Uuid> = attempts
            .values()
            .filter(|status| status.outcome.is_some())
            .map(|status| status.attempt_id)
            .collect();
        let excess = finished.len().saturating_sub(MAX_FINISHED_ATTEMPTS);
        for id in &finished[..excess] {
            attempts.remove(id);
        }
        if excess > 0 {
            tracing::debug!(pruned = excess, "Pruned finished checkout attempts");
        }
    }
}

/// Holds the checkout slot claimed by [`AppState::try_begin_attempt`].
pub struct AttemptSlot {
    in_flight: Arc<AtomicBool>,
}

impl Drop for AttemptSlot {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
