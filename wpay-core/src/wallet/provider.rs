use super::WalletError;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use wpay_sdk::objects::{AppMetadata, NamespaceConfig, Session, WalletPayRequest};

/// Resolves once the wallet answers the proposal. `Ok(None)` means the
/// approval completed without producing a session.
pub type ApprovalFuture = BoxFuture<'static, Result<Option<Session>, WalletError>>;

#[derive(Debug, Clone)]
pub struct ConnectProposal {
    pub metadata: AppMetadata,
    pub optional_namespaces: BTreeMap<String, NamespaceConfig>,
    pub wallet_pay: WalletPayRequest,
}

pub struct PendingConnection {
    /// Pairing URI to show the buyer.
    pub uri: String,
    pub approval: ApprovalFuture,
}

#[async_trait]
pub trait SignerClient: Send + Sync {
    /// Send a connection proposal. Returns as soon as the pairing URI is
    /// known; the wallet's answer arrives through the approval future.
    async fn connect(&self, proposal: ConnectProposal) -> Result<PendingConnection, WalletError>;

    /// Forget the namespaces negotiated by a previous session, so the next
    /// proposal starts from the requested capability set only.
    async fn reset_namespaces(&self);

    /// Whether a wallet session is currently established.
    fn has_session(&self) -> bool;

    /// Drop the connection and any session on it.
    async fn disconnect(&self) -> Result<(), WalletError>;
}

/// The modal the buyer scans the pairing URI from.
#[async_trait]
pub trait PresentationSurface: Send + Sync {
    async fn open(&self);
    async fn close(&self);
    /// `true` while the surface is shown.
    fn visibility(&self) -> watch::Receiver<bool>;
}

#[derive(Clone)]
pub struct WalletInstances {
    pub client: Arc<dyn SignerClient>,
    pub surface: Arc<dyn PresentationSurface>,
}

/// Creates the signer client and its presentation surface.
#[async_trait]
pub trait WalletBackend: Send + Sync {
    async fn initialize(&self) -> Result<WalletInstances, WalletError>;
}
