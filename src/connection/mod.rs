//! Server-side connection management
//!
//! Handles per-connection state, the shared registry and the connection lifecycle.

pub mod handle;
pub mod handler;
pub mod registry;

pub use handle::{ClientHandle, ClientId};
pub use handler::handle_connection;
pub use registry::ClientRegistry;
