//! Fixtures for handler tests.

use crate::modal::BrowserModal;
use crate::state::AppState;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wpay_core::checkout::{CheckoutOrchestrator, CheckoutServices};
use wpay_core::config::{CheckoutConfig, ConfigStore};
use wpay_core::events::session_event_channel;
use wpay_core::pricing::{CoinGeckoSource, ConversionService, PriceCache};
use wpay_core::storage::{KeyValueStore, MemoryStore};
use wpay_core::stores::{CartStore, SettingsStore};
use wpay_core::utils::clock::{Clock, ManualClock};
use wpay_core::wallet::{
    ConnectProposal, PendingConnection, SessionOptions, SignerClient, WalletBackend, WalletError,
    WalletInstances,
};
use wpay_sdk::objects::{AppMetadata, Session};

/// Rate source address for tests that never price a volatile asset.
pub const UNUSED_RATE_URL: &str = "http://127.0.0.1:9/";

pub const START_MILLIS: i64 = 1_700_000_000_000;

/// A wallet that shows the pairing URI and never answers it.
struct SilentClient;

#[async_trait]
impl SignerClient for SilentClient {
    async fn connect(&self, _proposal: ConnectProposal) -> Result<PendingConnection, WalletError> {
        Ok(PendingConnection {
            uri: "wc:test@2?relay-protocol=irn".to_string(),
            approval: Box::pin(std::future::pending::<Result<Option<Session>, WalletError>>()),
        })
    }

    async fn reset_namespaces(&self) {}

    fn has_session(&self) -> bool {
        false
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        Ok(())
    }
}

struct SilentWallet {
    modal: Arc<BrowserModal>,
}

#[async_trait]
impl WalletBackend for SilentWallet {
    async fn initialize(&self) -> Result<WalletInstances, WalletError> {
        Ok(WalletInstances {
            client: Arc::new(SilentClient),
            surface: self.modal.clone(),
        })
    }
}

/// App state over an in-memory store, a frozen clock and a silent wallet.
pub async fn test_state(rate_url: &str) -> AppState {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::at_millis(START_MILLIS));
    let (events, _) = session_event_channel();
    let modal = Arc::new(BrowserModal::new(events.clone()));

    let source = CoinGeckoSource::new(rate_url.parse().unwrap(), None).unwrap();
    let orchestrator = CheckoutOrchestrator::new(CheckoutServices {
        conversion: ConversionService::new(
            PriceCache::new(store.clone(), clock.clone()),
            Arc::new(source),
        ),
        cart: CartStore::load(store.clone()).await,
        settings: SettingsStore::load(store).await,
        config: ConfigStore::new(CheckoutConfig {
            success_delay: Duration::ZERO,
            ..CheckoutConfig::default()
        }),
        clock: clock.clone(),
        wallet: Arc::new(SilentWallet {
            modal: modal.clone(),
        }),
        session_options: SessionOptions {
            metadata: AppMetadata {
                name: "Test Store".to_string(),
                description: "test".to_string(),
                url: "http://localhost".to_string(),
                icons: vec![],
            },
            chains: vec!["eip155:8453".to_string()],
        },
        events,
    });

    AppState::new(orchestrator, modal, clock)
}

/// Send one request through the router and decode the body as JSON.
/// Non-JSON bodies come back as a JSON string.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// Poll `GET /checkout/{attempt_id}` until the attempt has an outcome.
pub async fn wait_for_outcome(router: &Router, attempt_id: &str) -> Value {
    let uri = format!("/api/v1/checkout/{attempt_id}");
    for _ in 0..200 {
        let (status, body) = send(router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        if !body["outcome"].is_null() {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("attempt {attempt_id} did not finish");
}

pub async fn wait_for_modal(state: &AppState) {
    for _ in 0..200 {
        if state.modal.is_open() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("wallet modal never opened");
}
