//! Relay configuration
//!
//! Defaults suitable for a single local process, overridable through
//! `RELAY_*` environment variables.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default broadcast queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default per-connection outbound buffer size
pub const DEFAULT_OUTBOUND_BUFFER: usize = 32;

/// Default time a sender may wait for queue space
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default time the dispatcher waits on one slow connection
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind_addr: String,
    pub queue_capacity: usize,
    pub enqueue_timeout: Duration,
    pub delivery_timeout: Duration,
    pub outbound_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}

impl RelayConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("RELAY_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(value) = lookup("RELAY_QUEUE_CAPACITY") {
            config.queue_capacity = parse_nonzero("RELAY_QUEUE_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("RELAY_OUTBOUND_BUFFER") {
            config.outbound_buffer = parse_nonzero("RELAY_OUTBOUND_BUFFER", &value)?;
        }
        if let Some(value) = lookup("RELAY_ENQUEUE_TIMEOUT_MS") {
            config.enqueue_timeout =
                Duration::from_millis(parse_nonzero("RELAY_ENQUEUE_TIMEOUT_MS", &value)?);
        }
        if let Some(value) = lookup("RELAY_DELIVERY_TIMEOUT_MS") {
            config.delivery_timeout =
                Duration::from_millis(parse_nonzero("RELAY_DELIVERY_TIMEOUT_MS", &value)?);
        }

        Ok(config)
    }

    /// Override the bind address
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }
}

fn parse_nonzero<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    let parsed: T = value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })?;
    if parsed == T::default() {
        return Err(ConfigError::Zero(key));
    }
    Ok(parsed)
}
