//! Listener configuration.
//!
//! ```rust
//! use kairos_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .http_addr("127.0.0.1:8080")
//!     .shutdown_timeout(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(config.http_addr(), "127.0.0.1:8080");
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{ServerError, ServerResult};

/// Address the server listens on unless configured otherwise.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// How long draining waits for in-flight requests unless configured otherwise.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Where to listen and how long to drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    http_addr: String,
    shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Starts from the defaults.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Configured bind address, as written.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Drain deadline.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// The bind address as a socket address.
    ///
    /// # Errors
    ///
    /// [`ServerError::Bind`] when the address is not `ip:port`.
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        self.http_addr
            .parse()
            .map_err(|e| ServerError::Bind(format!("invalid address '{}': {e}", self.http_addr)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            shutdown_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

/// Builder returned by [`ServerConfig::builder`].
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Listen on `addr` (`ip:port`; port `0` picks a free port).
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.http_addr = addr.into();
        self
    }

    /// Wait at most `timeout` for in-flight requests once shutdown begins.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_listen_on_8080_and_drain_for_10s() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr(), "0.0.0.0:8080");
        assert_eq!(config.shutdown_timeout(), DEFAULT_DRAIN_TIMEOUT);
        assert_eq!(ServerConfig::builder().build(), config);
    }

    #[test]
    fn test_ephemeral_port_parses() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_millis(250))
            .build();
        assert_eq!(config.socket_addr().unwrap().port(), 0);
        assert_eq!(config.shutdown_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_hostname_is_rejected_as_bind_error() {
        let config = ServerConfig::builder().http_addr("localhost:8080").build();
        match config.socket_addr() {
            Err(ServerError::Bind(msg)) => assert!(msg.contains("localhost:8080")),
            other => panic!("expected Bind, got {other:?}"),
        }
    }
}
