//! Configuration management for RAX Chat
//!
//! Defaults reproduce the protocol constants (port 7777, 2 s connect and
//! probe timeouts, 5 s retry delay). A `config.toml` and `RAX_CHAT__*`
//! environment variables may override them.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 7777;

/// Complete configuration for both sides of the chat
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ChatConfig {
    pub server: ServerSettings,
    pub client: ClientSettings,
}

/// Listener settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    /// IP address the listener binds to
    pub bind_address: String,

    /// TCP port the listener binds to
    pub port: u16,

    /// How long `stop()` waits for the accept loop to wind down
    pub stop_wait_ms: u64,
}

/// Client session settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientSettings {
    /// Server port to connect to
    pub port: u16,

    pub connect_timeout_ms: u64,
    pub probe_timeout_ms: u64,

    /// Port probed to decide reachability of non-loopback hosts
    pub probe_port: u16,

    /// Fixed delay between failed attempts
    pub retry_delay_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            stop_wait_ms: 1000,
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout_ms: 2000,
            probe_timeout_ms: 2000,
            probe_port: 7,
            retry_delay_ms: 5000,
        }
    }
}

impl ChatConfig {
    /// Load configuration from an optional TOML file with environment overrides
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("RAX_CHAT").separator("__"))
            .build()?;

        let config: ChatConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.server.bind_address.is_empty() {
            return Err(config::ConfigError::Message(
                "server.bind_address cannot be empty".into(),
            ));
        }

        if self.client.port == 0 {
            return Err(config::ConfigError::Message(
                "client.port cannot be 0".into(),
            ));
        }

        if self.client.connect_timeout_ms == 0 || self.client.probe_timeout_ms == 0 {
            return Err(config::ConfigError::Message(
                "client timeouts must be greater than 0".into(),
            ));
        }

        if self.client.retry_delay_ms == 0 {
            return Err(config::ConfigError::Message(
                "client.retry_delay_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl ServerSettings {
    /// Bind address and port as a socket address string
    pub fn bind_socket(&self, port: u16) -> String {
        format!("{}:{}", self.bind_address, port)
    }

    pub fn stop_wait(&self) -> Duration {
        Duration::from_millis(self.stop_wait_ms)
    }
}

impl ClientSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
