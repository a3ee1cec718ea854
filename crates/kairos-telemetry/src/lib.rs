//! Logging and metrics for Kairos.
//!
//! - **Logging**: structured JSON (or pretty) output via `tracing-subscriber`
//! - **Metrics**: call, race and persistence counters via the `metrics` facade
//!
//! # Example
//!
//! ```rust,ignore
//! use kairos_telemetry::{init_telemetry, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&LogConfig::default().with_service_name("kairos-server"))?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging and registers metric descriptions.
///
/// # Errors
///
/// Returns [`TelemetryError`] if the logging subscriber cannot be installed.
pub fn init_telemetry(config: &LogConfig) -> TelemetryResult<()> {
    init_logging(config)?;
    metrics::describe_metrics();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_telemetry_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_telemetry(&config).is_ok());
    }
}
