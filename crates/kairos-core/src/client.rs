//! Outbound HTTP port and its reqwest adapter.
//!
//! Calls go through the [`HttpClient`] trait so that the same client can be
//! shared by every request handler and race branch, and so tests can swap in
//! [`fixtures::ScriptedHttpClient`](crate::fixtures::ScriptedHttpClient).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, StatusCode};
use tokio::time::Instant;
use tracing::debug;

use crate::error::{CallError, CallResult};

/// Status and body of an answered request.
#[derive(Debug, Clone)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response body.
    pub body: Bytes,
}

impl HttpReply {
    /// Creates a reply.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a `200 OK` reply.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

/// Performs a single GET request that must not outlive `deadline`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends `GET url` and returns the status and full body.
    async fn get(&self, url: &str, deadline: Option<Instant>) -> CallResult<HttpReply>;
}

/// [`HttpClient`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Builds a client with a pooled connection set.
    pub fn new() -> CallResult<Self> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| CallError::transport(format!("failed to create client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn classify(error: &reqwest::Error, budget: Duration) -> CallError {
        if error.is_timeout() {
            CallError::Timeout { budget }
        } else if error.is_decode() {
            CallError::decode(error.to_string())
        } else {
            CallError::transport(error.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, deadline: Option<Instant>) -> CallResult<HttpReply> {
        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");

        let budget = deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or_default();
        if deadline.is_some() {
            request = request.timeout(budget);
        }

        debug!(url, budget_ms = budget.as_millis() as u64, "HTTP GET start");
        let response = request
            .send()
            .await
            .map_err(|e| Self::classify(&e, budget))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::classify(&e, budget))?;

        debug!(url, status = status.as_u16(), bytes = body.len(), "HTTP GET done");
        Ok(HttpReply { status, body })
    }
}
