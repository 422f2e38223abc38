//! WebSocket message types for the checkout session stream.
//!
//! `GET /api/v1/checkout/ws` upgrades to a WebSocket that plays the role of
//! the wallet modal: it receives the pairing URI (to render as a QR code),
//! session state changes and the final outcome, and it can dismiss the
//! modal.
//!
//! # Protocol
//!
//! 1. On upgrade the server sends [`WsServerMessage::Modal`] with the
//!    current visibility.
//! 2. While an attempt runs the server forwards every session event.
//! 3. The client may send [`WsClientMessage::Dismiss`] at any time. Before
//!    a wallet session exists this cancels the attempt.

use super::checkout::{CheckoutOutcomeView, SessionState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-to-client WebSocket message.
///
/// ```json
/// {"type":"display_uri","uri":"wc:…"}
/// {"type":"state","state":"awaiting_approval"}
/// {"type":"outcome","attempt_id":"…","outcome":{"status":"cancelled"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    /// Pairing URI of the pending connection proposal.
    DisplayUri { uri: String },
    /// Wallet session state transition.
    State { state: SessionState },
    /// Modal visibility changed.
    Modal { open: bool },
    /// An attempt reached its terminal outcome.
    Outcome {
        attempt_id: Uuid,
        outcome: CheckoutOutcomeView,
    },
    /// A server-side error that does not close the connection by itself.
    Error { code: u16, reason: String },
}

/// Client-to-server WebSocket message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientMessage {
    /// The buyer closed the modal.
    Dismiss,
}

/// Close codes used by the checkout stream.
pub struct WsCloseCode;

impl WsCloseCode {
    pub const NORMAL: u16 = 1000;

    /// The event stream ended because the server is shutting down.
    pub const GOING_AWAY: u16 = 1001;

    /// The client sent a frame that is not a [`WsClientMessage`].
    pub const INVALID_MESSAGE: u16 = 4000;
}
