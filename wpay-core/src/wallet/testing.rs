//! Scripted wallet doubles shared by the session and checkout tests.

use super::provider::{
    ApprovalFuture, ConnectProposal, PendingConnection, PresentationSurface, SignerClient, WalletBackend,
    WalletInstances,
};
use super::WalletError;
use async_trait::async_trait;
use futures_util::FutureExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use wpay_sdk::objects::{PendingRequest, Session, WALLET_PAY_METHOD};

/// What the next `connect` call does.
pub(crate) enum Script {
    Approve(Session),
    ApproveEmpty,
    ApprovalError(String),
    ConnectError(String),
    /// The wallet never answers.
    Hang,
    /// The buyer closes the modal before the pairing URI arrives.
    DismissDuringConnect,
    /// The relay never answers the proposal, so `connect` itself hangs.
    StallConnect,
}

/// A session whose only pending request is `wallet_pay` with `result`.
pub(crate) fn wallet_pay_session(result: Value) -> Session {
    Session {
        topic: "topic-1".to_string(),
        pending_requests: vec![PendingRequest {
            id: 1,
            method: WALLET_PAY_METHOD.to_string(),
            params: Value::Null,
        }],
        pending_requests_results: vec![if result.is_null() { None } else { Some(result) }],
        ..Default::default()
    }
}

pub(crate) struct FakeSurface {
    visible: watch::Sender<bool>,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
}

impl FakeSurface {
    pub fn dismiss(&self) {
        self.visible.send_replace(false);
    }
}

#[async_trait]
impl PresentationSurface for FakeSurface {
    async fn open(&self) {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.visible.send_replace(true);
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.visible.send_replace(false);
    }

    fn visibility(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }
}

pub(crate) struct FakeClient {
    surface: Arc<FakeSurface>,
    scripts: Mutex<VecDeque<Script>>,
    proposals: Mutex<Vec<ConnectProposal>>,
    pub session_live: Arc<AtomicBool>,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub namespace_resets: AtomicUsize,
}

impl FakeClient {
    pub fn last_proposal(&self) -> Option<ConnectProposal> {
        self.proposals.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SignerClient for FakeClient {
    async fn connect(&self, proposal: ConnectProposal) -> Result<PendingConnection, WalletError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.proposals.lock().unwrap().push(proposal);
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or(Script::Hang);

        if let Script::StallConnect = script {
            return futures_util::future::pending().await;
        }

        let live = self.session_live.clone();
        let approval: ApprovalFuture = match script {
            Script::ConnectError(message) => return Err(WalletError::Protocol(message)),
            Script::Approve(session) => async move {
                live.store(true, Ordering::SeqCst);
                Ok(Some(session))
            }
            .boxed(),
            Script::ApproveEmpty => async { Ok(None) }.boxed(),
            Script::ApprovalError(message) => async move { Err(WalletError::Rejected(message)) }.boxed(),
            Script::Hang => futures_util::future::pending().boxed(),
            Script::StallConnect => unreachable!(),
            Script::DismissDuringConnect => {
                self.surface.dismiss();
                futures_util::future::pending().boxed()
            }
        };
        Ok(PendingConnection {
            uri: "wc:fake@2".to_string(),
            approval,
        })
    }

    async fn reset_namespaces(&self) {
        self.namespace_resets.fetch_add(1, Ordering::SeqCst);
    }

    fn has_session(&self) -> bool {
        self.session_live.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.session_live.store(false, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct FakeBackend {
    client: Arc<FakeClient>,
    surface: Arc<FakeSurface>,
    pub inits: AtomicUsize,
    pub fail_init: AtomicBool,
}

#[async_trait]
impl WalletBackend for FakeBackend {
    async fn initialize(&self) -> Result<WalletInstances, WalletError> {
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(WalletError::Init("no provider".to_string()));
        }
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(WalletInstances {
            client: self.client.clone(),
            surface: self.surface.clone(),
        })
    }
}

pub(crate) struct FakeWallet {
    pub backend: Arc<FakeBackend>,
    pub client: Arc<FakeClient>,
    pub surface: Arc<FakeSurface>,
}

impl FakeWallet {
    pub fn new() -> Self {
        let (visible, _) = watch::channel(false);
        let surface = Arc::new(FakeSurface {
            visible,
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        });
        let client = Arc::new(FakeClient {
            surface: surface.clone(),
            scripts: Mutex::new(VecDeque::new()),
            proposals: Mutex::new(Vec::new()),
            session_live: Arc::new(AtomicBool::new(false)),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            namespace_resets: AtomicUsize::new(0),
        });
        let backend = Arc::new(FakeBackend {
            client: client.clone(),
            surface: surface.clone(),
            inits: AtomicUsize::new(0),
            fail_init: AtomicBool::new(false),
        });
        Self {
            backend,
            client,
            surface,
        }
    }

    pub fn script(&self, script: Script) {
        self.client.scripts.lock().unwrap().push_back(script);
    }

    pub fn assert_torn_down_once(&self) {
        assert_eq!(self.surface.closes.load(Ordering::SeqCst), 1);
        assert_eq!(self.client.disconnects.load(Ordering::SeqCst), 1);
    }
}
