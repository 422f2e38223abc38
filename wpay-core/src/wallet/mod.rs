//! Wallet connection and the `wallet_pay` negotiation.
//!
//! The signer client and the presentation surface sit behind traits in
//! [`provider`]. [`session::WalletSessionHandle`] drives one negotiation
//! against them and [`relay`] implements the client over a WebSocket relay.

pub mod provider;
pub mod relay;
pub mod session;

pub use provider::{
    ApprovalFuture, ConnectProposal, PendingConnection, PresentationSurface, SignerClient,
    WalletBackend, WalletInstances,
};
pub use relay::{RelayBackend, RelayClient, RelayConfig};
pub use session::{SessionOptions, WalletSessionHandle};

use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet provider initialization failed: {0}")]
    Init(String),

    #[error("relay transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("relay connection closed: {0}")]
    ConnectionClosed(String),

    #[error("relay protocol error: {0}")]
    Protocol(String),

    #[error("wallet rejected the session: {0}")]
    Rejected(String),

    #[error("invalid relay url: {0}")]
    Url(#[from] url::ParseError),
}

#[cfg(test)]
pub(crate) mod testing;
