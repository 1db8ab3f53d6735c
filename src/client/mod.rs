//! Client session system
//!
//! Handles the outbound connection, its state and the retry cycle.

pub mod session;
pub mod state;

pub use session::ChatClient;
pub use state::SessionState;
