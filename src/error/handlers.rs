//! Error handlers
//!
//! Provides error reporting and retry classification.

use crate::error::types::{ChatError, SessionError};
use log::error;

/// Handle a chat error
pub fn handle_error(err: &ChatError) {
    error!("Chat Error: {}", err);
}

/// Whether the client session should keep cycling after `err`.
pub fn is_retryable(err: &SessionError) -> bool {
    !matches!(err, SessionError::Validation(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::net::Ipv4Addr;

    #[test]
    fn test_only_validation_is_terminal() {
        assert!(!is_retryable(&SessionError::Validation("1.2.3".into())));
        assert!(is_retryable(&SessionError::Reachability(Ipv4Addr::new(10, 0, 0, 1))));
        assert!(is_retryable(&SessionError::Connect(
            "127.0.0.1:7777".parse().unwrap(),
            io::Error::from(io::ErrorKind::ConnectionRefused),
        )));
        assert!(is_retryable(&SessionError::ConnectTimeout(
            "10.0.0.1:7777".parse().unwrap()
        )));
        assert!(is_retryable(&SessionError::NotConnected));
    }
}
