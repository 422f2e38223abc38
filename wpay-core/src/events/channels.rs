use super::types::SessionEvent;
use tokio::sync::broadcast;

/// Buffer of the session event channel. Slow subscribers lag past this.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

pub type SessionEventSender = broadcast::Sender<SessionEvent>;
pub type SessionEventReceiver = broadcast::Receiver<SessionEvent>;

/// Create the session event channel.
///
/// More receivers are obtained with `sender.subscribe()`.
pub fn session_event_channel() -> (SessionEventSender, SessionEventReceiver) {
    broadcast::channel(DEFAULT_CHANNEL_BUFFER)
}
