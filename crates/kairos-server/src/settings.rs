//! Service configuration: file, then `KAIROS_*` environment, then flags.
//!
//! ```toml
//! [server]
//! port = 8080
//! addr = "0.0.0.0"
//! shutdown_timeout = "10s"
//!
//! [quote]
//! upstream_url = "https://economia.awesomeapi.com.br/json/last/USD-BRL"
//! pair = "USDBRL"
//! query_timeout = "200ms"
//! persist_timeout = "10ms"
//!
//! [storage]
//! database_url = "sqlite://cotacoes.sqlite"
//!
//! [telemetry]
//! log_level = "info"
//! json = true
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use kairos_core::duration::parse_duration;
use kairos_quote::{QuoteConfig, DEFAULT_PAIR, DEFAULT_UPSTREAM_URL};
use kairos_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::error::{ConfigError, ConfigResult};

/// Prefix of the environment variables that override file values.
pub const ENV_PREFIX: &str = "KAIROS_";

/// Full configuration of the `kairos-server` process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener settings.
    pub server: ServerSettings,
    /// Upstream and budget settings.
    pub quote: QuoteSettings,
    /// Database settings.
    pub storage: StorageSettings,
    /// Logging settings.
    pub telemetry: TelemetrySettings,
}

impl ServiceConfig {
    /// Loads a TOML or JSON file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {e}", path.display())))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match extension {
            "toml" => toml::from_str(&content)
                .map_err(|e| ConfigError::Parse(format!("invalid TOML: {e}"))),
            "json" => serde_json::from_str(&content)
                .map_err(|e| ConfigError::Parse(format!("invalid JSON: {e}"))),
            _ => Err(ConfigError::Parse(format!(
                "unsupported config format: {extension:?}"
            ))),
        }
    }

    /// Applies overrides from the process environment.
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by `lookup`, keyed by full variable name.
    ///
    /// Recognized: `KAIROS_PORT`, `KAIROS_ADDR`, `KAIROS_SHUTDOWN_TIMEOUT`,
    /// `KAIROS_UPSTREAM_URL`, `KAIROS_PAIR`, `KAIROS_QUERY_TIMEOUT`,
    /// `KAIROS_PERSIST_TIMEOUT`, `KAIROS_DATABASE_URL`, `KAIROS_LOG_LEVEL`,
    /// `KAIROS_LOG_JSON`.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let duration = |name: &str, value: String| {
            parse_duration(&value)
                .map_err(|e| ConfigError::invalid(format!("{ENV_PREFIX}{name}: {e}")))
        };

        if let Some(port) = var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(format!("{ENV_PREFIX}PORT: {e}")))?;
        }
        if let Some(addr) = var("ADDR") {
            self.server.addr = addr;
        }
        if let Some(value) = var("SHUTDOWN_TIMEOUT") {
            self.server.shutdown_timeout = duration("SHUTDOWN_TIMEOUT", value)?;
        }
        if let Some(url) = var("UPSTREAM_URL") {
            self.quote.upstream_url = url;
        }
        if let Some(pair) = var("PAIR") {
            self.quote.pair = pair;
        }
        if let Some(value) = var("QUERY_TIMEOUT") {
            self.quote.query_timeout = duration("QUERY_TIMEOUT", value)?;
        }
        if let Some(value) = var("PERSIST_TIMEOUT") {
            self.quote.persist_timeout = duration("PERSIST_TIMEOUT", value)?;
        }
        if let Some(url) = var("DATABASE_URL") {
            self.storage.database_url = url;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.telemetry.log_level = level;
        }
        if let Some(json) = var("LOG_JSON") {
            self.telemetry.json = json
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(format!("{ENV_PREFIX}LOG_JSON: {e}")))?;
        }

        Ok(self)
    }

    /// Checks values that would otherwise fail at first use.
    pub fn validate(&self) -> ConfigResult<()> {
        let url = &self.quote.upstream_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::invalid(
                "quote.upstream_url must start with http:// or https://",
            ));
        }
        if self.server.addr.trim().parse::<IpAddr>().is_err() {
            return Err(ConfigError::invalid(format!(
                "server.addr must be an IP address, got {:?}",
                self.server.addr
            )));
        }
        if self.quote.pair.trim().is_empty() {
            return Err(ConfigError::invalid("quote.pair must not be empty"));
        }
        for (name, value) in [
            ("server.shutdown_timeout", self.server.shutdown_timeout),
            ("quote.query_timeout", self.quote.query_timeout),
            ("quote.persist_timeout", self.quote.persist_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::invalid(format!("{name} must be greater than zero")));
            }
        }
        if self.storage.database_url.trim().is_empty() {
            return Err(ConfigError::invalid("storage.database_url must not be empty"));
        }
        Ok(())
    }

    /// Listener configuration.
    ///
    /// IPv6 addresses are bracketed (`[::]:8080`). An address that is not an
    /// IP is passed through for the bind to reject.
    pub fn server_config(&self) -> ServerConfig {
        let http_addr = match self.server.addr.trim().parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.server.port).to_string(),
            Err(_) => format!("{}:{}", self.server.addr, self.server.port),
        };
        ServerConfig::builder()
            .http_addr(http_addr)
            .shutdown_timeout(self.server.shutdown_timeout)
            .build()
    }

    /// Quote service configuration.
    pub fn quote_config(&self) -> QuoteConfig {
        QuoteConfig {
            upstream_url: self.quote.upstream_url.clone(),
            pair: self.quote.pair.clone(),
            query_timeout: self.quote.query_timeout,
            persist_timeout: self.quote.persist_timeout,
        }
    }

    /// Logging configuration.
    pub fn log_config(&self) -> LogConfig {
        LogConfig::production()
            .with_level(self.telemetry.log_level.clone())
            .with_json(self.telemetry.json)
            .with_service_name("kairos-server")
    }
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub addr: String,
    /// Drain deadline.
    #[serde(with = "kairos_core::duration::serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            addr: "0.0.0.0".to_string(),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// Upstream and budget settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSettings {
    /// Exchange-rate endpoint.
    pub upstream_url: String,
    /// Key wrapping the record in the upstream payload.
    pub pair: String,
    /// Budget of the upstream call.
    #[serde(with = "kairos_core::duration::serde")]
    pub query_timeout: Duration,
    /// Budget of the insert after a successful fetch.
    #[serde(with = "kairos_core::duration::serde")]
    pub persist_timeout: Duration,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            pair: DEFAULT_PAIR.to_string(),
            query_timeout: Duration::from_millis(200),
            persist_timeout: Duration::from_millis(10),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// sqlx SQLite URL.
    pub database_url: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://cotacoes.sqlite".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Level or filter directive.
    pub log_level: String,
    /// JSON output when `true`, pretty output otherwise.
    pub json: bool,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: true,
        }
    }
}
