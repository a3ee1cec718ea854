//! `kairos-cep-race`: looks up a CEP on ViaCEP and BrasilAPI at once and
//! reports whichever answers first with usable data.
//!
//! Exit codes: `0` with a winner, `1` on an invalid CEP or when no provider
//! answered within the budget.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use kairos_cli::cep::race_cep;
use kairos_core::duration::parse_duration;
use kairos_core::{CallContext, RaceOrchestrator, ReqwestHttpClient};
use kairos_telemetry::LogConfig;
use tracing::{error, info};

/// Race two postal-code providers and keep the fastest answer.
#[derive(Debug, Parser)]
#[command(name = "kairos-cep-race", version, about)]
struct Args {
    /// Postal code, as NNNNN-NNN or NNNNNNNN
    #[arg(long)]
    cep: String,

    /// Budget of each provider request (e.g. 1s, 500ms)
    #[arg(long, value_parser = parse_duration, default_value = "1s")]
    query_timeout: Duration,

    /// Emit JSON logs
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_config = LogConfig::development()
        .with_level("info")
        .with_json(args.json)
        .with_service_name("kairos-cep-race");
    if let Err(e) = kairos_telemetry::init_telemetry(&log_config) {
        eprintln!("kairos-cep-race: {e}");
        return ExitCode::FAILURE;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "CEP lookup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let client = ReqwestHttpClient::new().context("failed to create HTTP client")?;
    let orchestrator = RaceOrchestrator::new(Arc::new(client));

    let result = race_cep(&orchestrator, &CallContext::new(), &args.cep, args.query_timeout).await?;
    let winner = result.winner();
    info!(
        provider = %winner.label(),
        elapsed_ms = winner.elapsed().as_millis() as u64,
        payload = winner.payload().map_or("", String::as_str),
        "fastest provider"
    );
    Ok(())
}
