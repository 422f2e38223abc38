//! Signer client over a WebSocket relay.
//!
//! # Protocol
//!
//! Every frame is a JSON text message.
//!
//! 1. The client opens `{relay_url}?projectId=…` and sends
//!    `{"id":n,"method":"wc_sessionPropose","params":{metadata, optionalNamespaces, walletPay}}`.
//! 2. The relay answers `{"id":n,"result":{"uri":"wc:…"}}` or
//!    `{"id":n,"error":{"message":…}}`.
//! 3. Once the wallet decides, the relay sends `wc_sessionSettle` with the
//!    session as `params`, or `wc_sessionReject` with `{"message":…}`.
//! 4. On disconnect the client sends `wc_sessionDelete` (only when a session
//!    was settled) followed by a close frame.

use super::WalletError;
use super::provider::{
    ConnectProposal, PendingConnection, PresentationSurface, SignerClient, WalletBackend,
    WalletInstances,
};
use crate::config::WalletConfig;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;
use wpay_sdk::objects::{AppMetadata, NamespaceConfig, Session, WalletPayRequest};

const METHOD_PROPOSE: &str = "wc_sessionPropose";
const METHOD_SETTLE: &str = "wc_sessionSettle";
const METHOD_REJECT: &str = "wc_sessionReject";
const METHOD_DELETE: &str = "wc_sessionDelete";

type RelaySocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub relay_url: Url,
    pub project_id: String,
}

impl From<&WalletConfig> for RelayConfig {
    fn from(config: &WalletConfig) -> Self {
        Self {
            relay_url: config.relay_url.clone(),
            project_id: config.project_id.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProposeParams<'a> {
    metadata: &'a AppMetadata,
    optional_namespaces: &'a BTreeMap<String, NamespaceConfig>,
    wallet_pay: &'a WalletPayRequest,
    /// Namespaces granted to the previous session, offered for resumption.
    #[serde(skip_serializing_if = "Option::is_none")]
    namespaces: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RelayFrame {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RelayErrorBody>,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RelayErrorBody {
    #[serde(default)]
    message: String,
}

struct RelayConnection {
    sink: SplitSink<RelaySocket, Message>,
    reader: JoinHandle<()>,
}

pub struct RelayClient {
    config: RelayConfig,
    next_id: AtomicU64,
    connection: Mutex<Option<RelayConnection>>,
    session_live: Arc<AtomicBool>,
    namespaces: Arc<Mutex<Option<BTreeMap<String, Value>>>>,
}

impl RelayClient {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
            connection: Mutex::new(None),
            session_live: Arc::new(AtomicBool::new(false)),
            namespaces: Arc::new(Mutex::new(None)),
        }
    }

    fn endpoint(&self) -> Url {
        let mut url = self.config.relay_url.clone();
        if !self.config.project_id.is_empty() {
            url.query_pairs_mut()
                .append_pair("projectId", &self.config.project_id);
        }
        url
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn send_frame(
        sink: &mut SplitSink<RelaySocket, Message>,
        frame: &Value,
    ) -> Result<(), WalletError> {
        sink.send(Message::Text(frame.to_string().into())).await?;
        Ok(())
    }
}

/// Reads frames until the response to request `id` arrives and returns the
/// pairing URI from it.
async fn await_pairing_uri(
    stream: &mut SplitStream<RelaySocket>,
    id: u64,
) -> Result<String, WalletError> {
    while let Some(message) = stream.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let frame: RelayFrame =
            serde_json::from_str(&text).map_err(|e| WalletError::Protocol(e.to_string()))?;
        if frame.id != Some(id) {
            debug!(method = ?frame.method, "Skipping unrelated relay frame");
            continue;
        }
        if let Some(error) = frame.error {
            return Err(WalletError::Rejected(error.message));
        }
        return frame
            .result
            .as_ref()
            .and_then(|r| r.get("uri"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| WalletError::Protocol("proposal response without uri".to_string()));
    }
    Err(WalletError::ConnectionClosed(
        "relay closed before answering the proposal".to_string(),
    ))
}

/// Waits for the wallet's decision on the proposal.
async fn await_settlement(
    mut stream: SplitStream<RelaySocket>,
) -> Result<Option<Session>, WalletError> {
    while let Some(message) = stream.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let frame: RelayFrame = match serde_json::from_str(&text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed relay frame");
                continue;
            }
        };
        match frame.method.as_deref() {
            Some(METHOD_SETTLE) => {
                return match frame.params.filter(|p| !p.is_null()) {
                    Some(params) => serde_json::from_value(params)
                        .map(Some)
                        .map_err(|e| WalletError::Protocol(e.to_string())),
                    None => Ok(None),
                };
            }
            Some(METHOD_REJECT) => {
                let reason = frame
                    .params
                    .as_ref()
                    .and_then(|p| p.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("rejected")
                    .to_string();
                return Err(WalletError::Rejected(reason));
            }
            other => debug!(method = ?other, "Skipping relay frame while awaiting settlement"),
        }
    }
    Err(WalletError::ConnectionClosed(
        "relay closed before the wallet responded".to_string(),
    ))
}

#[async_trait]
impl SignerClient for RelayClient {
    async fn connect(&self, proposal: ConnectProposal) -> Result<PendingConnection, WalletError> {
        // a previous socket must not outlive a new proposal
        if let Err(e) = self.disconnect().await {
            warn!(error = %e, "Failed to close previous relay connection");
        }

        let endpoint = self.endpoint();
        let (socket, _) = tokio_tungstenite::connect_async(endpoint.as_str()).await?;
        let (mut sink, mut stream) = socket.split();

        let id = self.next_id();
        let params = ProposeParams {
            metadata: &proposal.metadata,
            optional_namespaces: &proposal.optional_namespaces,
            wallet_pay: &proposal.wallet_pay,
            namespaces: self.namespaces.lock().await.clone(),
        };
        Self::send_frame(
            &mut sink,
            &json!({ "id": id, "method": METHOD_PROPOSE, "params": params }),
        )
        .await?;
        let uri = await_pairing_uri(&mut stream, id).await?;
        info!(order_id = %proposal.wallet_pay.order_id, "Relay accepted connection proposal");

        let (tx, rx) = oneshot::channel();
        let session_live = self.session_live.clone();
        let namespaces = self.namespaces.clone();
        let reader = tokio::spawn(async move {
            let settled = await_settlement(stream).await;
            if let Ok(Some(session)) = &settled {
                session_live.store(true, Ordering::SeqCst);
                *namespaces.lock().await = Some(session.namespaces.clone());
            }
            let _ = tx.send(settled);
        });
        *self.connection.lock().await = Some(RelayConnection { sink, reader });

        Ok(PendingConnection {
            uri,
            approval: Box::pin(async move {
                rx.await.map_err(|_| {
                    WalletError::ConnectionClosed("relay reader stopped".to_string())
                })?
            }),
        })
    }

    async fn reset_namespaces(&self) {
        *self.namespaces.lock().await = None;
    }

    fn has_session(&self) -> bool {
        self.session_live.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        let Some(mut connection) = self.connection.lock().await.take() else {
            return Ok(());
        };
        connection.reader.abort();
        if self.session_live.swap(false, Ordering::SeqCst) {
            let id = self.next_id();
            Self::send_frame(
                &mut connection.sink,
                &json!({ "id": id, "method": METHOD_DELETE }),
            )
            .await?;
        }
        connection.sink.close().await?;
        debug!("Relay connection closed");
        Ok(())
    }
}

/// Builds a fresh [`RelayClient`] per initialization, paired with a shared
/// presentation surface.
pub struct RelayBackend {
    config: RelayConfig,
    surface: Arc<dyn PresentationSurface>,
}

impl RelayBackend {
    pub fn new(config: RelayConfig, surface: Arc<dyn PresentationSurface>) -> Self {
        Self { config, surface }
    }
}

#[async_trait]
impl WalletBackend for RelayBackend {
    async fn initialize(&self) -> Result<WalletInstances, WalletError> {
        debug!(relay = %self.config.relay_url, "Initializing relay signer client");
        Ok(WalletInstances {
            client: Arc::new(RelayClient::new(self.config.clone())),
            surface: self.surface.clone(),
        })
    }
}
