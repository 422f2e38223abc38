//! Session events.
//!
//! Everything the buyer's modal needs to see while a checkout runs is
//! published on one broadcast channel:
//!
//! 1. `WalletSessionHandle` emits `DisplayUri` and `StateChanged`
//! 2. the presentation surface emits `ModalVisibility`
//! 3. `CheckoutOrchestrator` emits `AttemptFinished`
//!
//! Events are ephemeral. Subscribers that lag simply miss them.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, SessionEventReceiver, SessionEventSender, session_event_channel,
};
pub use types::SessionEvent;
