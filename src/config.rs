//! Configuration for surrealrpc
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{DriverError, Result};
use crate::protocol::MAX_PAYLOAD_SIZE;

/// Main configuration for a client connection
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Server address (host:port) used by the TCP transport
    pub server_addr: String,

    /// Connect timeout (milliseconds, 0 = OS default)
    pub connect_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// Disable Nagle's algorithm on the socket
    pub nodelay: bool,

    /// Largest message accepted or sent on the wire (bytes)
    pub max_message_size: usize,

    // -------------------------------------------------------------------------
    // Call Configuration
    // -------------------------------------------------------------------------
    /// Deadline applied to calls whose context carries none.
    /// Also the lifetime of an abandoned one-shot waiter.
    pub request_timeout: Duration,

    /// How often the dispatcher evicts expired one-shot waiters
    pub sweep_interval: Duration,

    /// Capacity of the writer's outbound queue
    pub outbound_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8000".to_string(),
            connect_timeout_ms: 5000,
            write_timeout_ms: 5000,
            nodelay: true,
            max_message_size: MAX_PAYLOAD_SIZE,
            request_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(1),
            outbound_capacity: 1024,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the pump cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.outbound_capacity == 0 {
            return Err(DriverError::Config(
                "outbound_capacity must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(DriverError::Config(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(DriverError::Config(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(DriverError::Config(
                "max_message_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server address
    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server_addr = addr.into();
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    /// Set the maximum message size (in bytes)
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Set the default per-call deadline
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the expired-waiter sweep interval
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Set the outbound queue capacity
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.config.outbound_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
