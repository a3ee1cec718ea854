//! Client of the Kairos exchange-rate endpoint.
//!
//! Fetches the current bid within a short budget and appends it to a text
//! file as `Dólar: <bid>`. The bid is written exactly as the server sent it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kairos_core::{call_with_deadline, CallContext, CallError, CallResult, CallSpec, HttpClient};
use kairos_quote::DEFAULT_PAIR;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{CliError, CliResult};

/// Default endpoint of a local server.
pub const DEFAULT_QUOTE_URL: &str = "http://localhost:8080/cotacao";

/// Default request budget.
pub const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_millis(300);

/// Default output file.
pub const DEFAULT_OUTPUT: &str = "cotacao.txt";

/// Settings of one quote-client run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteClientConfig {
    /// Server endpoint.
    pub url: String,
    /// Budget of the request.
    pub timeout: Duration,
    /// File the quote line is appended to.
    pub output: PathBuf,
}

impl Default for QuoteClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_QUOTE_URL.to_string(),
            timeout: DEFAULT_QUOTE_TIMEOUT,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

/// The line written for `bid`.
pub fn quote_line(bid: &str) -> String {
    format!("Dólar: {bid}")
}

/// Extracts the textual bid from a quote body, wrapped in the pair or flat.
///
/// A string bid is kept verbatim once it reads as a number. A JSON number
/// is written in its shortest form.
pub fn decode_bid(body: &[u8]) -> CallResult<String> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| CallError::decode(e.to_string()))?;
    let record = match value.get(DEFAULT_PAIR) {
        Some(inner) if inner.is_object() => inner,
        _ => &value,
    };

    match record.get("bid") {
        Some(Value::String(bid)) if bid.trim().parse::<f64>().is_ok() => Ok(bid.clone()),
        Some(Value::Number(bid)) => Ok(bid.to_string()),
        Some(other) => Err(CallError::decode(format!("bid is not a number: {other}"))),
        None => Err(CallError::decode("missing bid")),
    }
}

/// Fetches the bid from `url` within `timeout`.
pub async fn fetch_bid(
    ctx: &CallContext,
    client: &dyn HttpClient,
    url: &str,
    timeout: Duration,
) -> CliResult<String> {
    let spec = CallSpec::new("quote", url, timeout, decode_bid);
    Ok(call_with_deadline(ctx, client, &spec).await?)
}

/// Appends the quote line for `bid` to `path`, creating the file if missing.
pub async fn append_quote(path: &Path, bid: &str) -> CliResult<()> {
    let output_error = |source| CliError::Output {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(output_error)?;

    let line = format!("{}\n", quote_line(bid));
    file.write_all(line.as_bytes()).await.map_err(output_error)?;
    file.flush().await.map_err(output_error)?;
    Ok(())
}

/// Fetches the current bid and records it. Returns the bid.
pub async fn run_quote_client(
    ctx: &CallContext,
    client: &dyn HttpClient,
    config: &QuoteClientConfig,
) -> CliResult<String> {
    let bid = fetch_bid(ctx, client, &config.url, config.timeout).await?;
    info!(bid = %bid, "quote received");

    append_quote(&config.output, &bid).await?;
    info!(output = %config.output.display(), "quote recorded");
    Ok(bid)
}
