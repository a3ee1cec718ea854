//! `kairos-quote-client`: asks a Kairos server for the current dollar bid
//! and appends it to a text file.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use kairos_cli::quote::{run_quote_client, QuoteClientConfig, DEFAULT_OUTPUT, DEFAULT_QUOTE_URL};
use kairos_core::duration::parse_duration;
use kairos_core::{CallContext, ReqwestHttpClient};
use kairos_telemetry::LogConfig;
use tracing::error;

/// Fetch the current exchange rate and record it.
#[derive(Debug, Parser)]
#[command(name = "kairos-quote-client", version, about)]
struct Args {
    /// Exchange-rate endpoint
    #[arg(long, default_value = DEFAULT_QUOTE_URL)]
    url: String,

    /// Budget of the request (e.g. 300ms)
    #[arg(long, value_parser = parse_duration, default_value = "300ms")]
    timeout: Duration,

    /// File the quote is appended to
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_config = LogConfig::development()
        .with_level("info")
        .with_service_name("kairos-quote-client");
    if let Err(e) = kairos_telemetry::init_telemetry(&log_config) {
        eprintln!("kairos-quote-client: {e}");
        return ExitCode::FAILURE;
    }

    let config = QuoteClientConfig {
        url: args.url,
        timeout: args.timeout,
        output: args.output,
    };

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "quote client failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &QuoteClientConfig) -> anyhow::Result<()> {
    let client = ReqwestHttpClient::new().context("failed to create HTTP client")?;
    run_quote_client(&CallContext::new(), &client, config).await?;
    Ok(())
}
