//! Presentation boundary
//!
//! I/O tasks never render anything themselves. Each observable event is
//! logged and handed to whatever front-end holds the receiving end of the
//! event channel.

use log::{debug, info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::client::SessionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A line for the front-end's log view
    LogLine(String),
    /// Client session moved to a new state
    State(SessionState),
}

/// Notification capability injected into every component.
#[derive(Clone)]
pub struct Notifier {
    tx: Option<UnboundedSender<ChatEvent>>,
}

impl Notifier {
    /// Creates a notifier together with the receiver the front-end drains.
    pub fn channel() -> (Self, UnboundedReceiver<ChatEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier that only writes to the log.
    pub fn silent() -> Self {
        Self { tx: None }
    }

    /// Append a line to the log view.
    ///
    /// Lines are logged at info level when nobody renders them, at debug
    /// level otherwise.
    pub fn line(&self, text: impl Into<String>) {
        let text = text.into();
        if self.tx.is_some() {
            debug!("{}", text);
        } else {
            info!("{}", text);
        }
        self.emit(ChatEvent::LogLine(text));
    }

    pub fn state(&self, state: SessionState) {
        self.emit(ChatEvent::State(state));
    }

    fn emit(&self, event: ChatEvent) {
        if let Some(tx) = &self.tx {
            // A front-end that went away must not stall the I/O tasks
            let _ = tx.send(event);
        }
    }
}
