//! The wallet modal as seen by the browser.
//!
//! The server has no window of its own. Opening the modal means telling
//! every connected checkout WebSocket to show the pairing QR code; the
//! buyer closing it arrives back as a dismiss request.

use async_trait::async_trait;
use tokio::sync::watch;
use wpay_core::events::{SessionEvent, SessionEventSender};
use wpay_core::wallet::PresentationSurface;

pub struct BrowserModal {
    visible: watch::Sender<bool>,
    events: SessionEventSender,
}

impl BrowserModal {
    pub fn new(events: SessionEventSender) -> Self {
        let (visible, _) = watch::channel(false);
        Self { visible, events }
    }

    pub fn is_open(&self) -> bool {
        *self.visible.borrow()
    }

    /// Hide the modal on behalf of the buyer. Returns `false` if it was
    /// already hidden.
    pub fn dismiss(&self) -> bool {
        self.set(false)
    }

    fn set(&self, open: bool) -> bool {
        let previous = self.visible.send_replace(open);
        if previous == open {
            return false;
        }
        tracing::debug!(open, "Wallet modal visibility changed");
        let _ = self.events.send(SessionEvent::ModalVisibility { open });
        true
    }
}

#[async_trait]
impl PresentationSurface for BrowserModal {
    async fn open(&self) {
        self.set(true);
    }

    async fn close(&self) {
        self.set(false);
    }

    fn visibility(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }
}
