//! Error types
//!
//! Defines the error taxonomy shared by the frame codec, the server side
//! connection handling and the client session.

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};

/// Frame codec errors. On a live connection every variant is treated as a disconnect.
#[derive(Debug)]
pub enum FrameError {
    /// Encoded text does not fit the 16-bit length prefix.
    Oversized(usize),
    /// Stream ended cleanly before a new frame started.
    ConnectionClosed,
    /// Stream ended in the middle of a frame.
    Truncated { expected: usize, received: usize },
    InvalidUtf8,
    Io(io::Error),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Oversized(len) => {
                write!(f, "Frame too large: {} bytes (max {})", len, u16::MAX)
            }
            FrameError::ConnectionClosed => write!(f, "Connection closed by peer"),
            FrameError::Truncated { expected, received } => write!(
                f,
                "Stream closed mid-frame: expected {} bytes, received {}",
                expected, received
            ),
            FrameError::InvalidUtf8 => write!(f, "Frame payload is not valid UTF-8"),
            FrameError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<io::Error> for FrameError {
    fn from(error: io::Error) -> Self {
        FrameError::Io(error)
    }
}

/// Content filter rejection: the offending message is dropped and the sender notified.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolViolation(pub String);

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Disallowed characters in message: {}", self.0)
    }
}

impl std::error::Error for ProtocolViolation {}

/// Client session errors
#[derive(Debug)]
pub enum SessionError {
    /// Malformed server address. The only terminal session error.
    Validation(String),
    Reachability(Ipv4Addr),
    Connect(SocketAddr, io::Error),
    ConnectTimeout(SocketAddr),
    NotConnected,
    Frame(FrameError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Validation(addr) => write!(f, "Invalid IP address: {}", addr),
            SessionError::Reachability(ip) => write!(f, "IP address {} is not reachable", ip),
            SessionError::Connect(addr, e) => write!(f, "Failed to connect to {}: {}", addr, e),
            SessionError::ConnectTimeout(addr) => write!(f, "Connection to {} timed out", addr),
            SessionError::NotConnected => write!(f, "Not connected to a server"),
            SessionError::Frame(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<FrameError> for SessionError {
    fn from(error: FrameError) -> Self {
        SessionError::Frame(error)
    }
}

/// Listener errors
#[derive(Debug)]
pub enum ServerError {
    Bind(String, io::Error),
    Io(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Bind(addr, e) => write!(f, "Failed to bind to {}: {}", addr, e),
            ServerError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::Io(error)
    }
}

/// General chat error that encompasses all error types
#[derive(Debug)]
pub enum ChatError {
    Session(SessionError),
    Server(ServerError),
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Session(e) => write!(f, "Session error: {}", e),
            ChatError::Server(e) => write!(f, "Server error: {}", e),
            ChatError::Config(e) => write!(f, "Configuration error: {}", e),
            ChatError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<SessionError> for ChatError {
    fn from(error: SessionError) -> Self {
        ChatError::Session(error)
    }
}

impl From<ServerError> for ChatError {
    fn from(error: ServerError) -> Self {
        ChatError::Server(error)
    }
}

impl From<config::ConfigError> for ChatError {
    fn from(error: config::ConfigError) -> Self {
        ChatError::Config(error)
    }
}

impl From<io::Error> for ChatError {
    fn from(error: io::Error) -> Self {
        ChatError::IoError(error)
    }
}
