//! Server and configuration error types.

use thiserror::Error;

/// Result type alias using [`ServerError`].
pub type ServerResult<T> = Result<T, ServerError>;

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Server lifecycle failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(String),

    /// The drain deadline elapsed with connections still open.
    #[error("shutdown timed out with {active} connection(s) still active")]
    ShutdownTimeout {
        /// Connections still open when the deadline elapsed.
        active: usize,
    },
}

/// Configuration loading and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Read(String),

    /// The file could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A value is out of range or malformed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates an [`ConfigError::Invalid`] error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_display() {
        assert!(ServerError::Bind("in use".to_string())
            .to_string()
            .contains("bind error"));
        assert_eq!(
            ServerError::ShutdownTimeout { active: 2 }.to_string(),
            "shutdown timed out with 2 connection(s) still active"
        );
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::invalid("port must not be zero").to_string(),
            "invalid configuration: port must not be zero"
        );
    }
}
