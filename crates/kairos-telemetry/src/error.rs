//! Telemetry setup errors.

use thiserror::Error;

/// Why logging or metrics could not be set up.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A setting could not be used as given.
    #[error("invalid telemetry configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::LoggingInit("a global default trace dispatcher has already been set".to_string());
        assert!(err.to_string().starts_with("failed to initialize logging"));

        let err = TelemetryError::InvalidConfig("log level is empty".to_string());
        assert_eq!(
            err.to_string(),
            "invalid telemetry configuration: log level is empty"
        );
    }
}
