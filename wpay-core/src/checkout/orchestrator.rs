use super::request::build_wallet_pay_request;
use super::{CheckoutError, CheckoutOutcome};
use crate::config::{CheckoutConfig, ConfigStore};
use crate::events::{SessionEvent, SessionEventSender};
use crate::money::Money;
use crate::pricing::{ConversionService, ConvertUsd};
use crate::stores::{CartSnapshot, CartStore, SettingsStore};
use crate::utils::clock::Clock;
use crate::wallet::{SessionOptions, WalletBackend, WalletSessionHandle};
use kanau::processor::Processor;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wpay_sdk::objects::{PaymentAsset, PaymentMethod, ShippingInfo, Stablecoin, WalletPayRequest};

/// One press of the checkout button.
#[derive(Debug, Clone)]
pub struct CheckoutAttempt {
    pub id: Uuid,
    pub cart: CartSnapshot,
    pub shipping: ShippingInfo,
    pub method: PaymentMethod,
    /// Overrides the asset from the settings.
    pub asset: Option<PaymentAsset>,
}

impl CheckoutAttempt {
    pub fn new(
        cart: CartSnapshot,
        shipping: ShippingInfo,
        method: PaymentMethod,
        asset: Option<PaymentAsset>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            cart,
            shipping,
            method,
            asset,
        }
    }
}

/// Everything the orchestrator depends on.
pub struct CheckoutServices {
    pub conversion: ConversionService,
    pub cart: CartStore,
    pub settings: SettingsStore,
    pub config: ConfigStore<CheckoutConfig>,
    pub clock: Arc<dyn Clock>,
    pub wallet: Arc<dyn WalletBackend>,
    pub session_options: SessionOptions,
    pub events: SessionEventSender,
}

#[derive(Clone)]
pub struct CheckoutOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    conversion: ConversionService,
    cart: CartStore,
    settings: SettingsStore,
    config: ConfigStore<CheckoutConfig>,
    clock: Arc<dyn Clock>,
    wallet: Arc<dyn WalletBackend>,
    session_options: Arc<SessionOptions>,
    events: SessionEventSender,
    /// The buyer's wallet session. Held for the whole negotiation, so a
    /// second crypto attempt waits for the previous teardown.
    session_slot: Mutex<Option<WalletSessionHandle>>,
}

impl CheckoutOrchestrator {
    pub fn new(services: CheckoutServices) -> Self {
        Self {
            inner: Arc::new(Inner {
                conversion: services.conversion,
                cart: services.cart,
                settings: services.settings,
                config: services.config,
                clock: services.clock,
                wallet: services.wallet,
                session_options: Arc::new(services.session_options),
                events: services.events,
                session_slot: Mutex::new(None),
            }),
        }
    }

    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    pub fn conversion(&self) -> &ConversionService {
        &self.inner.conversion
    }

    pub fn config(&self) -> &ConfigStore<CheckoutConfig> {
        &self.inner.config
    }

    pub fn events(&self) -> &SessionEventSender {
        &self.inner.events
    }

    /// Run `attempt` to its terminal outcome and announce it on the event
    /// channel.
    #[tracing::instrument(skip_all, fields(attempt_id = %attempt.id, method = ?attempt.method))]
    pub async fn checkout(&self, attempt: CheckoutAttempt) -> CheckoutOutcome {
        info!(
            lines = attempt.cart.items.len(),
            total = %attempt.cart.total_price,
            "Checkout attempt started"
        );

        let outcome = self.run(&attempt).await;
        match &outcome {
            CheckoutOutcome::Success { transaction_ref } => {
                info!(transaction_ref = %transaction_ref, "Checkout completed")
            }
            CheckoutOutcome::Failure { reason } => {
                warn!(code = ?reason.code(), reason = %reason, "Checkout failed")
            }
            CheckoutOutcome::Cancelled => info!("Checkout cancelled by buyer"),
        }

        let _ = self.inner.events.send(SessionEvent::AttemptFinished {
            attempt_id: attempt.id,
            outcome: outcome.view(),
        });
        outcome
    }

    async fn run(&self, attempt: &CheckoutAttempt) -> CheckoutOutcome {
        if attempt.cart.is_empty() {
            return CheckoutError::EmptyCart.into();
        }

        let outcome = match attempt.method {
            PaymentMethod::CreditCard => CheckoutOutcome::Success {
                transaction_ref: format!("card_{}", Uuid::new_v4().simple()),
            },
            PaymentMethod::Crypto => self.pay_with_wallet(attempt).await,
        };

        if outcome.is_success() {
            if attempt.method == PaymentMethod::Crypto {
                let delay = self.inner.config.read().await.success_delay;
                tokio::time::sleep(delay).await;
            }
            if let Err(e) = self.inner.cart.clear().await {
                warn!(error = %e, "Payment succeeded but the cart could not be cleared");
            }
        }
        outcome
    }

    async fn pay_with_wallet(&self, attempt: &CheckoutAttempt) -> CheckoutOutcome {
        let request = match self.prepare_request(attempt).await {
            Ok(request) => request,
            Err(e) => return e.into(),
        };
        let reuse_provider = self.inner.config.read().await.reuse_provider;

        let mut slot = self.inner.session_slot.lock().await;
        let mut handle = self.take_handle(&mut slot, reuse_provider);
        let outcome = handle.send(request).await;
        *slot = Some(handle);
        outcome
    }

    fn take_handle(
        &self,
        slot: &mut Option<WalletSessionHandle>,
        reuse_provider: bool,
    ) -> WalletSessionHandle {
        if reuse_provider {
            if let Some(mut handle) = slot.take() {
                if handle.rearm() {
                    debug!("Re-arming wallet session handle");
                    return handle;
                }
            }
        }
        WalletSessionHandle::new(
            self.inner.wallet.clone(),
            self.inner.session_options.clone(),
            self.inner.events.clone(),
        )
    }

    async fn prepare_request(
        &self,
        attempt: &CheckoutAttempt,
    ) -> Result<WalletPayRequest, CheckoutError> {
        let settings = self.inner.settings.current().await;
        let recipient = settings.recipient_address.trim();
        if recipient.is_empty() {
            return Err(CheckoutError::MissingRecipient);
        }

        let asset = attempt
            .asset
            .clone()
            .unwrap_or_else(|| settings.effective_asset());
        let symbol = asset.symbol();
        let total = Money::usd(attempt.cart.total_price)
            .map_err(|e| CheckoutError::InvalidAmount(e.to_string()))?;

        let amount = if Stablecoin::from_symbol(&symbol).is_some() {
            total.amount()
        } else {
            self.inner
                .conversion
                .process(ConvertUsd {
                    amount: total,
                    symbol: symbol.clone(),
                })
                .await?
                .converted_amount
                .amount()
        };

        let ttl = self.inner.config.read().await.request_ttl;
        let expiry = self.inner.clock.now().unix_timestamp() + ttl.as_secs() as i64;
        debug!(symbol = %symbol, amount = %amount, expiry, "Built payment request");
        build_wallet_pay_request(&asset, recipient, amount, attempt.id.to_string(), expiry)
    }
}
