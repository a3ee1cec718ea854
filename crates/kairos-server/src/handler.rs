//! Request handler seam and response helpers.

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, Method, Response, StatusCode};
use http_body_util::Full;
use kairos_core::CallContext;
use serde::Serialize;

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Produces the response for one request.
///
/// `ctx` is bound to the server's in-flight cancellation: it fires when the
/// drain deadline elapses, so outbound work started from it is cut short.
/// Failures are reported in the response; they never affect the server.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    /// Handles `method path`.
    async fn handle(&self, ctx: &CallContext, method: &Method, path: &str) -> HttpResponse;
}

/// Error body: `{"message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    /// Human-readable reason.
    pub message: &'a str,
}

/// Serializes `value` as a JSON response with `status`.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap_or_else(|_| Response::new(Full::new(Bytes::new()))),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode response");
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

/// Builds a `{"message": ...}` error response.
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &ErrorBody { message })
}
