//! Module `state`
//!
//! Defines the connection states a client session cycles through.

use std::fmt;

/// Where a client session currently is in its connect/retry cycle.
///
/// The cycle is Validating → ProbingReachability → Connecting → Connected →
/// Disconnected and back to Validating. `Failed` is entered only after the
/// server address fails validation and is never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Validating,
    ProbingReachability,
    Connecting,
    Connected,
    Disconnected,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Validating => "validating",
            SessionState::ProbingReachability => "probing reachability",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Disconnected => "disconnected",
            SessionState::Failed => "failed",
        };
        f.write_str(label)
    }
}
