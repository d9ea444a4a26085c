//! Server configuration

use std::net::SocketAddr;
use thiserror::Error;

const DEFAULT_LOG_FILTER: &str = "docrelay=debug,tower_http=debug";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid bind address {0:?}")]
    InvalidBindAddr(String),

    #[error("Invalid port {0:?}")]
    InvalidPort(String),

    #[error("Invalid connection limit {0:?}")]
    InvalidMaxConnections(String),
}

/// Server configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// tracing-subscriber filter directive used when RUST_LOG is unset
    pub log_filter: String,

    /// Maximum concurrent WebSocket connections (0 = unlimited)
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            max_connections: 0,
        }
    }
}

impl ServerConfig {
    /// Load overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// `DOCRELAY_BIND_ADDR` wins over `PORT`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("DOCRELAY_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(addr.clone()))?;
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
            config.bind_addr.set_port(port);
        }

        if let Some(max) = lookup("DOCRELAY_MAX_CONNECTIONS") {
            config.max_connections = max
                .parse()
                .map_err(|_| ConfigError::InvalidMaxConnections(max.clone()))?;
        }

        if let Some(filter) = lookup("RUST_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }
}
