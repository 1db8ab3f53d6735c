pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod protocol;
pub mod server;
pub mod utils;

pub use client::ChatClient;
pub use config::ChatConfig;
pub use events::{ChatEvent, Notifier};
pub use server::Server;
