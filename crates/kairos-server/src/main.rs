//! `kairos-server`: serves `GET /cotacao` until SIGINT/SIGTERM, then drains.
//!
//! Exit codes: `0` after a clean drain, `1` on startup failure or when the
//! drain deadline elapses with requests still in flight.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use kairos_core::duration::parse_duration;
use kairos_core::ReqwestHttpClient;
use kairos_quote::{QuoteService, SqliteExchangeStore};
use kairos_server::{QuoteRoutes, Server, ServerError, ServiceConfig, ShutdownSignal};
use tracing::{error, info};

/// Exchange-rate server with bounded fetch, persist and drain budgets.
#[derive(Debug, Parser)]
#[command(name = "kairos-server", version, about)]
struct Args {
    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP server port
    #[arg(long)]
    port: Option<u16>,

    /// Budget for the upstream exchange-rate request (e.g. 200ms)
    #[arg(long, value_parser = parse_duration)]
    query_timeout: Option<Duration>,

    /// Budget for persisting a fetched rate (e.g. 10ms)
    #[arg(long, value_parser = parse_duration)]
    persist_timeout: Option<Duration>,

    /// How long shutdown waits for in-flight requests (e.g. 10s)
    #[arg(long, value_parser = parse_duration)]
    shutdown_timeout: Option<Duration>,

    /// SQLite database URL
    #[arg(long)]
    database_url: Option<String>,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<ServiceConfig> {
        let config = match &self.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };
        let mut config = config.with_env_overrides()?;

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(timeout) = self.query_timeout {
            config.quote.query_timeout = timeout;
        }
        if let Some(timeout) = self.persist_timeout {
            config.quote.persist_timeout = timeout;
        }
        if let Some(timeout) = self.shutdown_timeout {
            config.server.shutdown_timeout = timeout;
        }
        if let Some(url) = &self.database_url {
            config.storage.database_url.clone_from(url);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("kairos-server: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = kairos_telemetry::init_telemetry(&config.log_config()) {
        eprintln!("kairos-server: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => exit_code(&e),
    }
}

/// Logs a fatal error and maps it to the process exit code.
///
/// An unfinished drain is a failure even though every listener closed.
fn exit_code(error: &anyhow::Error) -> ExitCode {
    if let Some(ServerError::ShutdownTimeout { active }) = error.downcast_ref::<ServerError>() {
        error!(active, "graceful shutdown did not complete in time");
    } else {
        let message = format!("{error:#}");
        error!(error = %message, "server failed");
    }
    ExitCode::FAILURE
}

async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    let store = SqliteExchangeStore::connect(&config.storage.database_url)
        .await
        .context("failed to open exchange store")?;
    let store = Arc::new(store);
    let client = Arc::new(ReqwestHttpClient::new().context("failed to create HTTP client")?);

    let service = QuoteService::new(client, Arc::clone(&store) as _, &config.quote_config());
    let routes = QuoteRoutes::new(Arc::new(service));

    let shutdown = ShutdownSignal::with_os_signals();
    let server = Server::new(config.server_config(), Arc::new(routes))
        .bind()
        .await?;
    info!(
        addr = %server.local_addr(),
        upstream = %config.quote.upstream_url,
        "kairos-server started"
    );

    server.serve(shutdown).await?;
    store.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // `ExitCode` has no `PartialEq` on the supported toolchain.
    fn same(left: ExitCode, right: ExitCode) -> bool {
        format!("{left:?}") == format!("{right:?}")
    }

    #[test]
    fn test_drain_timeout_exits_non_zero() {
        let error = anyhow::Error::from(ServerError::ShutdownTimeout { active: 2 });
        let code = exit_code(&error);
        assert!(same(code, ExitCode::FAILURE));
        assert!(!same(code, ExitCode::SUCCESS));
    }

    #[test]
    fn test_drain_timeout_behind_context_exits_non_zero() {
        let error = anyhow::Error::from(ServerError::ShutdownTimeout { active: 1 })
            .context("serving stopped");
        assert!(same(exit_code(&error), ExitCode::FAILURE));
    }

    #[test]
    fn test_startup_failure_exits_non_zero() {
        let error = anyhow::Error::from(ServerError::Bind("address in use".to_string()))
            .context("failed to start");
        assert!(same(exit_code(&error), ExitCode::FAILURE));
    }
}
