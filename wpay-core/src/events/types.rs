use uuid::Uuid;
use wpay_sdk::objects::{CheckoutOutcomeView, SessionState, WsServerMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Pairing URI of a pending connection proposal.
    DisplayUri { uri: String },
    StateChanged { state: SessionState },
    ModalVisibility { open: bool },
    AttemptFinished {
        attempt_id: Uuid,
        outcome: CheckoutOutcomeView,
    },
}

impl From<SessionEvent> for WsServerMessage {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::DisplayUri { uri } => WsServerMessage::DisplayUri { uri },
            SessionEvent::StateChanged { state } => WsServerMessage::State { state },
            SessionEvent::ModalVisibility { open } => WsServerMessage::Modal { open },
            SessionEvent::AttemptFinished {
                attempt_id,
                outcome,
            } => WsServerMessage::Outcome {
                attempt_id,
                outcome,
            },
        }
    }
}
