//! Structured logging for Kairos processes.
//!
//! Servers log JSON lines; command-line tools default to the pretty format.
//! The level accepts any `EnvFilter` directive, e.g. `"info,kairos_core=debug"`.
//!
//! Field names used across the workspace: `label`, `elapsed_ms`, `error`,
//! `request_id`, `method`, `path`, `http.status_code`.
//!
//! # Example
//!
//! ```rust,ignore
//! use kairos_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development().with_level("info"))?;
//! tracing::info!(label = "ViaCEP", elapsed_ms = 81, "call finished");
//! ```

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// How a process writes its logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Install no subscriber at all when `false`.
    pub enabled: bool,

    /// `EnvFilter` directive.
    pub level: String,

    /// One JSON object per line instead of the pretty format.
    pub json_format: bool,

    /// Log span open and close.
    pub span_events: bool,

    /// Include source file and line.
    pub file_line_info: bool,

    /// Include the thread id.
    pub thread_ids: bool,

    /// Include the module path.
    pub include_target: bool,

    /// Name of the process, logged once at startup.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Pretty, verbose output for local runs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            json_format: false,
            level: "debug".to_string(),
            span_events: true,
            file_line_info: true,
            ..Self::production()
        }
    }

    /// JSON at `info`, no span events or source locations.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            service_name: "kairos".to_string(),
        }
    }

    /// Replaces the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Chooses JSON (`true`) or pretty (`false`) output.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// Names the process.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// [`TelemetryError::InvalidConfig`] for a bad level directive,
/// [`TelemetryError::LoggingInit`] if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);
    let output: Box<dyn Layer<Registry> + Send + Sync> = if config.json_format {
        base.json().boxed()
    } else {
        base.pretty().boxed()
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        level = %config.level,
        json = config.json_format,
        "logging initialized"
    );
    Ok(())
}

/// Parses a filter directive.
///
/// # Errors
///
/// [`TelemetryError::InvalidConfig`] if the directive is blank or malformed.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    if directive.trim().is_empty() {
        return Err(TelemetryError::InvalidConfig("log level is empty".to_string()));
    }
    EnvFilter::try_new(directive).map_err(|e| {
        TelemetryError::InvalidConfig(format!("invalid log level {directive:?}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_servers_default_to_json_at_info() {
        let config = LogConfig::default();
        assert_eq!(config, LogConfig::production());
        assert!(config.json_format);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_development_is_pretty_and_verbose() {
        let config = LogConfig::development();
        assert!(!config.json_format);
        assert!(config.span_events);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
        assert_eq!(config.service_name, "kairos");
    }

    #[test]
    fn test_cli_style_overrides() {
        let config = LogConfig::development()
            .with_level("info")
            .with_json(true)
            .with_service_name("kairos-cep-race");
        assert_eq!(config.level, "info");
        assert!(config.json_format);
        assert_eq!(config.service_name, "kairos-cep-race");
    }

    #[test]
    fn test_filter_directives() {
        assert!(create_env_filter("warn").is_ok());
        assert!(create_env_filter("info,kairos_core=debug,sqlx=warn").is_ok());
        assert!(matches!(
            create_env_filter(""),
            Err(TelemetryError::InvalidConfig(_))
        ));
        assert!(matches!(
            create_env_filter("kairos_core=loud"),
            Err(TelemetryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_disabled_installs_nothing() {
        let config = LogConfig {
            enabled: false,
            level: String::new(),
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
