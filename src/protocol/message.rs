//! Module `message`
//!
//! Server-to-client message kinds and how each is rendered on the wire.

/// Prefix used for everything the server says on its own behalf.
pub const SERVER_PREFIX: &str = "Server";

/// Sent to a client whose message failed the content filter.
pub const REJECTION_TEXT: &str = "Special characters are not allowed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Chat,
    SystemNotice,
    Rejection,
}

/// A transient, already rendered message. Never stored beyond delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    rendered: String,
}

impl Message {
    /// `"<name>: <text>"`
    pub fn chat(name: &str, text: &str) -> Self {
        Self {
            kind: MessageKind::Chat,
            rendered: format!("{}: {}", name, text),
        }
    }

    /// `"Server: <text>"`
    pub fn notice(text: &str) -> Self {
        Self {
            kind: MessageKind::SystemNotice,
            rendered: format!("{}: {}", SERVER_PREFIX, text),
        }
    }

    pub fn rejection() -> Self {
        Self {
            kind: MessageKind::Rejection,
            rendered: format!("{}: {}", SERVER_PREFIX, REJECTION_TEXT),
        }
    }

    pub fn joined(name: &str) -> Self {
        Self::notice(&format!("{} has joined the chat", name))
    }

    pub fn left(name: &str) -> Self {
        Self::notice(&format!("{} has left the chat", name))
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Text exactly as it goes into the frame.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering() {
        assert_eq!(Message::chat("bob", "hello").rendered(), "bob: hello");
        assert_eq!(
            Message::joined("bob").rendered(),
            "Server: bob has joined the chat"
        );
        assert_eq!(
            Message::left("bob").rendered(),
            "Server: bob has left the chat"
        );

        let rejection = Message::rejection();
        assert_eq!(rejection.kind(), MessageKind::Rejection);
        assert_eq!(
            rejection.rendered(),
            "Server: Special characters are not allowed."
        );
    }
}
