//! Server core functionality
//!
//! This module contains the listener that accepts connections and manages
//! start/stop of the whole chat server.

pub mod core;

pub use self::core::Server;
