//! Deadline-bounded single calls.
//!
//! A [`CallSpec`] names one outbound GET: a label, a target URL, the time it
//! is allowed to take, and how to decode the body. [`call_with_deadline`]
//! runs it inside a child of the caller's [`CallContext`], and [`execute`]
//! wraps the same call with timing to produce a [`CallOutcome`].
//!
//! No retries are attempted: one failed attempt is final for that call.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use kairos_core::{call_with_deadline, CallContext, CallSpec, ReqwestHttpClient};
//!
//! let client = ReqwestHttpClient::new()?;
//! let spec = CallSpec::<serde_json::Value>::json(
//!     "awesomeapi",
//!     "https://economia.awesomeapi.com.br/json/last/USD-BRL",
//!     Duration::from_millis(200),
//! );
//! let value = call_with_deadline(&CallContext::new(), &client, &spec).await?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::HttpClient;
use crate::context::CallContext;
use crate::error::{CallError, CallResult};
use crate::outcome::CallOutcome;

/// Turns a response body into the expected payload.
pub type Decoder<T> = Arc<dyn Fn(&[u8]) -> CallResult<T> + Send + Sync>;

/// Description of one outbound call.
pub struct CallSpec<T> {
    label: String,
    target: String,
    timeout: Duration,
    decoder: Decoder<T>,
}

impl<T> CallSpec<T> {
    /// Creates a spec with a custom decoder.
    pub fn new<D>(
        label: impl Into<String>,
        target: impl Into<String>,
        timeout: Duration,
        decoder: D,
    ) -> Self
    where
        D: Fn(&[u8]) -> CallResult<T> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            target: target.into(),
            timeout,
            decoder: Arc::new(decoder),
        }
    }

    /// Label used in logs, metrics and race results.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Target URL.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Time the call may take, relative to when it starts.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Decodes a body with this spec's decoder.
    pub fn decode(&self, body: &[u8]) -> CallResult<T> {
        (self.decoder)(body)
    }
}

impl<T: DeserializeOwned> CallSpec<T> {
    /// Creates a spec that decodes the body as JSON into `T`.
    pub fn json(label: impl Into<String>, target: impl Into<String>, timeout: Duration) -> Self {
        Self::new(label, target, timeout, |body| {
            serde_json::from_slice(body).map_err(|e| CallError::decode(e.to_string()))
        })
    }
}

impl CallSpec<String> {
    /// Creates a spec whose payload is the body as UTF-8 text.
    ///
    /// An empty body carries no usable data and is reported as a decode error.
    pub fn text(label: impl Into<String>, target: impl Into<String>, timeout: Duration) -> Self {
        Self::new(label, target, timeout, |body| {
            if body.is_empty() {
                return Err(CallError::decode("empty response body"));
            }
            String::from_utf8(body.to_vec()).map_err(|e| CallError::decode(e.to_string()))
        })
    }
}

impl<T> Clone for CallSpec<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            target: self.target.clone(),
            timeout: self.timeout,
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl<T> fmt::Debug for CallSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSpec")
            .field("label", &self.label)
            .field("target", &self.target)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Runs one call bounded by `min(ctx deadline, now + spec.timeout())`.
///
/// Non-2xx replies become [`CallError::Protocol`]; bodies that fail to decode
/// become [`CallError::Decode`].
pub async fn call_with_deadline<T>(
    ctx: &CallContext,
    client: &dyn HttpClient,
    spec: &CallSpec<T>,
) -> CallResult<T> {
    let scope = ctx.child(spec.timeout);
    let reply = scope.run(client.get(&spec.target, scope.deadline())).await??;

    if !reply.status.is_success() {
        return Err(CallError::Protocol {
            status: reply.status.as_u16(),
        });
    }

    spec.decode(&reply.body)
}

/// Runs one call and records its outcome and elapsed time.
pub async fn execute<T>(
    ctx: &CallContext,
    client: &dyn HttpClient,
    spec: &CallSpec<T>,
) -> CallOutcome<T> {
    debug!(label = %spec.label, target = %spec.target, "call start");
    let start = Instant::now();
    let result = call_with_deadline(ctx, client, spec).await;
    let elapsed = start.elapsed();

    match &result {
        Ok(_) => {
            debug!(label = %spec.label, elapsed_ms = elapsed.as_millis() as u64, "call finished");
            kairos_telemetry::metrics::record_call(&spec.label, "success", elapsed);
        }
        Err(e) => {
            warn!(label = %spec.label, elapsed_ms = elapsed.as_millis() as u64, error = %e, "call failed");
            kairos_telemetry::metrics::record_call(&spec.label, e.kind(), elapsed);
        }
    }

    CallOutcome::new(spec.label.clone(), elapsed, result)
}
