//! One `wallet_pay` negotiation.
//!
//! ```text
//! Uninitialized -> Initializing -> AwaitingApproval -> Approved -> Extracting -> Closed
//!                        \                 \
//!                         +-----------------+--> Failed
//! ```
//!
//! Whatever the path, the surface is closed and the client disconnected
//! exactly once before `send` returns.

use super::WalletError;
use super::provider::{ConnectProposal, PresentationSurface, SignerClient, WalletBackend, WalletInstances};
use crate::checkout::{CheckoutError, CheckoutOutcome};
use crate::config::WalletConfig;
use crate::events::{SessionEvent, SessionEventSender};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use wpay_sdk::objects::{
    AppMetadata, NamespaceConfig, Session, SessionState, WALLET_PAY_METHOD, WalletPayRequest,
};

/// Fields of a `wallet_pay` result object that carry the transaction reference.
const TRANSACTION_REF_FIELDS: [&str; 3] = ["txid", "transactionHash", "hash"];

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub metadata: AppMetadata,
    pub chains: Vec<String>,
}

impl SessionOptions {
    pub fn from_config(config: &WalletConfig) -> Self {
        Self {
            metadata: config.metadata.clone(),
            chains: config.chains.clone(),
        }
    }

    fn proposal(&self, wallet_pay: WalletPayRequest) -> ConnectProposal {
        let mut optional_namespaces = BTreeMap::new();
        optional_namespaces.insert(
            "eip155".to_string(),
            NamespaceConfig::eip155(self.chains.clone()),
        );
        ConnectProposal {
            metadata: self.metadata.clone(),
            optional_namespaces,
            wallet_pay,
        }
    }
}

/// Owns the lifecycle of a single negotiation.
///
/// The provider and surface are created on first use and kept for the
/// lifetime of the handle. A handle runs one negotiation; call
/// [`rearm`](Self::rearm) to run another on the same provider.
pub struct WalletSessionHandle {
    backend: Arc<dyn WalletBackend>,
    options: Arc<SessionOptions>,
    events: SessionEventSender,
    instances: Option<WalletInstances>,
    state: watch::Sender<SessionState>,
}

impl WalletSessionHandle {
    pub fn new(
        backend: Arc<dyn WalletBackend>,
        options: Arc<SessionOptions>,
        events: SessionEventSender,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            backend,
            options,
            events,
            instances: None,
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Make a finished handle usable again. Returns `false` while a
    /// negotiation is still in progress.
    pub fn rearm(&mut self) -> bool {
        let state = self.state();
        if state.is_terminal() {
            self.transition(SessionState::Uninitialized);
        }
        self.state() == SessionState::Uninitialized
    }

    /// Run the negotiation for `request` and report how it ended.
    pub async fn send(&mut self, request: WalletPayRequest) -> CheckoutOutcome {
        if self.state() != SessionState::Uninitialized {
            warn!(state = ?self.state(), "Refusing to reuse a spent wallet session handle");
            return CheckoutError::HandleSpent.into();
        }
        self.transition(SessionState::Initializing);

        let instances = match self.instances().await {
            Ok(instances) => instances,
            Err(e) => {
                warn!(error = %e, "Wallet provider initialization failed");
                self.transition(SessionState::Failed);
                return CheckoutError::provider(e.to_string()).into();
            }
        };

        let order_id = request.order_id.clone();
        let negotiated = self.negotiate(&instances, request).await;
        self.teardown(&instances).await;

        match negotiated {
            Ok(Some(transaction_ref)) => {
                self.transition(SessionState::Closed);
                info!(order_id = %order_id, transaction_ref = %transaction_ref, "Wallet payment completed");
                CheckoutOutcome::Success { transaction_ref }
            }
            Ok(None) => {
                self.transition(SessionState::Closed);
                warn!(order_id = %order_id, "Wallet connected without processing the payment request");
                CheckoutError::RequestNotProcessed.into()
            }
            Err(e) => {
                self.transition(SessionState::Failed);
                info!(order_id = %order_id, reason = %e, "Wallet negotiation ended without payment");
                e.into()
            }
        }
    }

    async fn instances(&mut self) -> Result<WalletInstances, WalletError> {
        if let Some(instances) = &self.instances {
            debug!("Reusing wallet provider");
            return Ok(instances.clone());
        }
        let instances = self.backend.initialize().await?;
        self.instances = Some(instances.clone());
        Ok(instances)
    }

    async fn negotiate(
        &self,
        instances: &WalletInstances,
        request: WalletPayRequest,
    ) -> Result<Option<String>, CheckoutError> {
        instances.surface.open().await;
        let mut visibility = instances.surface.visibility();
        instances.client.reset_namespaces().await;

        // connect and approval both race the dismissal; a relay that never
        // answers the proposal must not outlive a closed modal
        let connect_and_approve = async {
            let pending = instances
                .client
                .connect(self.options.proposal(request))
                .await
                .map_err(|e| CheckoutError::provider(e.to_string()))?;
            debug!(uri = %pending.uri, "Connection proposal sent");
            let _ = self.events.send(SessionEvent::DisplayUri {
                uri: pending.uri.clone(),
            });
            self.transition(SessionState::AwaitingApproval);
            pending
                .approval
                .await
                .map_err(|e| CheckoutError::provider(e.to_string()))
        };

        let session = tokio::select! {
            approval = connect_and_approve => approval?,
            () = wait_for_dismissal(&mut visibility, instances.client.as_ref()) => {
                return Err(CheckoutError::UserCancelled);
            }
        };
        let Some(session) = session else {
            return Err(CheckoutError::NoSession);
        };
        self.transition(SessionState::Approved);

        self.transition(SessionState::Extracting);
        Ok(extract_transaction_ref(&session))
    }

    async fn teardown(&self, instances: &WalletInstances) {
        instances.surface.close().await;
        if let Err(e) = instances.client.disconnect().await {
            warn!(error = %e, "Failed to disconnect wallet client");
        }
        debug!("Wallet session torn down");
    }

    fn transition(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = ?previous, to = ?state, "Wallet session state changed");
            let _ = self.events.send(SessionEvent::StateChanged { state });
        }
    }
}

/// Resolves once the surface is hidden while no wallet session exists.
async fn wait_for_dismissal(visibility: &mut watch::Receiver<bool>, client: &dyn SignerClient) {
    loop {
        let visible = *visibility.borrow_and_update();
        if !visible && !client.has_session() {
            return;
        }
        if visibility.changed().await.is_err() {
            // surface gone; only the approval can finish the race now
            std::future::pending::<()>().await;
        }
    }
}

/// Transaction reference of the `wallet_pay` request in an approved session.
///
/// `None` when the session carries no such request or no result for it.
pub(crate) fn extract_transaction_ref(session: &Session) -> Option<String> {
    let result = session.pending_request_result(WALLET_PAY_METHOD)?;
    Some(transaction_ref(result))
}

fn transaction_ref(result: &Value) -> String {
    if let Value::String(s) = result {
        return s.clone();
    }
    TRANSACTION_REF_FIELDS
        .iter()
        .find_map(|field| result.get(field).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| result.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::session_event_channel;
    use crate::wallet::testing::{FakeWallet, Script, wallet_pay_session};
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use wpay_sdk::objects::{AcceptedPayment, PendingRequest};

    fn request() -> WalletPayRequest {
        WalletPayRequest {
            version: "1.0.0".into(),
            order_id: "order-1".to_string(),
            accepted_payments: vec![AcceptedPayment {
                recipient: "eip155:8453:0xabc".to_string(),
                asset: "eip155:8453/slip44:60".to_string(),
                amount: "0xb1a2bc2ec50000".to_string(),
            }],
            expiry: 1_700_000_600,
        }
    }

    fn handle(wallet: &FakeWallet) -> WalletSessionHandle {
        let (events, _) = session_event_channel();
        WalletSessionHandle::new(
            wallet.backend.clone(),
            Arc::new(SessionOptions {
                metadata: AppMetadata {
                    name: "Shop".to_string(),
                    description: "test".to_string(),
                    url: "http://localhost".to_string(),
                    icons: vec![],
                },
                chains: vec!["eip155:1".to_string()],
            }),
            events,
        )
    }

    #[tokio::test]
    async fn test_approved_session_with_result_at_index_zero() {
        let wallet = FakeWallet::new();
        wallet.script(Script::Approve(wallet_pay_session(json!({"txid": "0xabc"}))));
        let mut handle = handle(&wallet);

        let outcome = handle.send(request()).await;
        assert_eq!(
            outcome,
            CheckoutOutcome::Success {
                transaction_ref: "0xabc".to_string()
            }
        );
        assert_eq!(handle.state(), SessionState::Closed);
        wallet.assert_torn_down_once();

        assert_eq!(wallet.client.namespace_resets.load(Ordering::SeqCst), 1);
        let proposal = wallet.client.last_proposal().unwrap();
        let eip155 = &proposal.optional_namespaces["eip155"];
        assert!(eip155.methods.iter().any(|m| m == WALLET_PAY_METHOD));
        assert_eq!(proposal.wallet_pay, request());
    }

    #[tokio::test]
    async fn test_missing_result_is_not_processed() {
        let wallet = FakeWallet::new();
        wallet.script(Script::Approve(wallet_pay_session(Value::Null)));
        let mut handle = handle(&wallet);

        let outcome = handle.send(request()).await;
        assert_eq!(
            outcome,
            CheckoutOutcome::Failure {
                reason: CheckoutError::RequestNotProcessed
            }
        );
        assert_eq!(handle.state(), SessionState::Closed);
        wallet.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_empty_approval_is_no_session() {
        let wallet = FakeWallet::new();
        wallet.script(Script::ApproveEmpty);
        let mut handle = handle(&wallet);

        let outcome = handle.send(request()).await;
        assert_eq!(
            outcome,
            CheckoutOutcome::Failure {
                reason: CheckoutError::NoSession
            }
        );
        assert_eq!(handle.state(), SessionState::Failed);
        wallet.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_provider_errors_still_tear_down() {
        let wallet = FakeWallet::new();
        wallet.script(Script::ConnectError("relay unreachable".to_string()));
        let mut handle = handle(&wallet);

        let outcome = handle.send(request()).await;
        assert!(matches!(
            outcome,
            CheckoutOutcome::Failure {
                reason: CheckoutError::ProviderError { ref message }
            } if message.contains("relay unreachable")
        ));
        assert_eq!(handle.state(), SessionState::Failed);
        wallet.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_rejection_is_a_provider_error() {
        let wallet = FakeWallet::new();
        wallet.script(Script::ApprovalError("user rejected".to_string()));
        let mut handle = handle(&wallet);

        let outcome = handle.send(request()).await;
        assert!(matches!(
            outcome,
            CheckoutOutcome::Failure {
                reason: CheckoutError::ProviderError { .. }
            }
        ));
        wallet.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_dismissal_while_awaiting_approval_cancels() {
        let wallet = FakeWallet::new();
        wallet.script(Script::Hang);
        let mut handle = handle(&wallet);
        let mut states = handle.subscribe_state();
        let surface = wallet.surface.clone();

        let (outcome, _) = tokio::join!(handle.send(request()), async move {
            states
                .wait_for(|s| *s == SessionState::AwaitingApproval)
                .await
                .unwrap();
            surface.dismiss();
        });

        assert_eq!(outcome, CheckoutOutcome::Cancelled);
        assert_eq!(handle.state(), SessionState::Failed);
        wallet.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_dismissal_during_connect_cancels() {
        let wallet = FakeWallet::new();
        wallet.script(Script::DismissDuringConnect);
        let mut handle = handle(&wallet);

        assert_eq!(handle.send(request()).await, CheckoutOutcome::Cancelled);
        wallet.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_dismissal_while_connect_stalls_cancels() {
        let wallet = FakeWallet::new();
        wallet.script(Script::StallConnect);
        let mut handle = handle(&wallet);
        let surface = wallet.surface.clone();
        let mut visibility = surface.visibility();

        let (outcome, _) = tokio::time::timeout(
            Duration::from_secs(2),
            async {
                tokio::join!(handle.send(request()), async move {
                    visibility.wait_for(|visible| *visible).await.unwrap();
                    surface.dismiss();
                })
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome, CheckoutOutcome::Cancelled);
        assert_eq!(handle.state(), SessionState::Failed);
        assert_eq!(wallet.client.connects.load(Ordering::SeqCst), 1);
        wallet.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_hidden_surface_with_live_session_does_not_cancel() {
        let wallet = FakeWallet::new();
        wallet.client.session_live.store(true, Ordering::SeqCst);
        wallet.surface.dismiss();
        let mut visibility = wallet.surface.visibility();

        let waited = tokio::time::timeout(
            Duration::from_millis(50),
            wait_for_dismissal(&mut visibility, wallet.client.as_ref()),
        )
        .await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_spent_handle_refuses_until_rearmed() {
        let wallet = FakeWallet::new();
        wallet.script(Script::Approve(wallet_pay_session(json!("0x01"))));
        wallet.script(Script::Approve(wallet_pay_session(json!("0x02"))));
        let mut handle = handle(&wallet);

        assert!(handle.send(request()).await.is_success());
        assert_eq!(
            handle.send(request()).await,
            CheckoutOutcome::Failure {
                reason: CheckoutError::HandleSpent
            }
        );
        assert_eq!(wallet.client.connects.load(Ordering::SeqCst), 1);

        assert!(handle.rearm());
        assert_eq!(
            handle.send(request()).await,
            CheckoutOutcome::Success {
                transaction_ref: "0x02".to_string()
            }
        );
        // provider is created once per handle
        assert_eq!(wallet.backend.inits.load(Ordering::SeqCst), 1);
        assert_eq!(wallet.surface.closes.load(Ordering::SeqCst), 2);
        assert_eq!(wallet.client.disconnects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_init_failure_fails_without_connecting() {
        let wallet = FakeWallet::new();
        wallet.backend.fail_init.store(true, Ordering::SeqCst);
        let mut handle = handle(&wallet);

        let outcome = handle.send(request()).await;
        assert!(matches!(
            outcome,
            CheckoutOutcome::Failure {
                reason: CheckoutError::ProviderError { .. }
            }
        ));
        assert_eq!(handle.state(), SessionState::Failed);
        assert_eq!(wallet.client.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_events_carry_uri_and_states() {
        let wallet = FakeWallet::new();
        wallet.script(Script::Approve(wallet_pay_session(json!("0x01"))));
        let (events, mut rx) = session_event_channel();
        let mut handle = WalletSessionHandle::new(
            wallet.backend.clone(),
            Arc::new(SessionOptions {
                metadata: AppMetadata {
                    name: "Shop".to_string(),
                    description: String::new(),
                    url: String::new(),
                    icons: vec![],
                },
                chains: vec![],
            }),
            events,
        );
        handle.send(request()).await;

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                SessionEvent::StateChanged {
                    state: SessionState::Initializing
                },
                SessionEvent::DisplayUri {
                    uri: "wc:fake@2".to_string()
                },
                SessionEvent::StateChanged {
                    state: SessionState::AwaitingApproval
                },
                SessionEvent::StateChanged {
                    state: SessionState::Approved
                },
                SessionEvent::StateChanged {
                    state: SessionState::Extracting
                },
                SessionEvent::StateChanged {
                    state: SessionState::Closed
                },
            ]
        );
    }

    #[test]
    fn test_transaction_ref_shapes() {
        assert_eq!(transaction_ref(&json!("0xdead")), "0xdead");
        assert_eq!(transaction_ref(&json!({"transactionHash": "0x1"})), "0x1");
        assert_eq!(transaction_ref(&json!({"hash": "0x2"})), "0x2");
        assert_eq!(transaction_ref(&json!({"other": 1})), r#"{"other":1}"#);
    }

    #[test]
    fn test_extraction_matches_by_method() {
        let session = Session {
            topic: "t".to_string(),
            pending_requests: vec![
                PendingRequest {
                    id: 1,
                    method: "personal_sign".to_string(),
                    params: Value::Null,
                },
                PendingRequest {
                    id: 2,
                    method: WALLET_PAY_METHOD.to_string(),
                    params: Value::Null,
                },
            ],
            pending_requests_results: vec![Some(json!("0xsig")), Some(json!({"txid": "0xpay"}))],
            ..Default::default()
        };
        assert_eq!(extract_transaction_ref(&session).as_deref(), Some("0xpay"));
        assert_eq!(extract_transaction_ref(&Session::default()), None);
    }
}
