//! The exchange-rate endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use http::{header, HeaderValue, Method, StatusCode};
use kairos_core::CallContext;
use kairos_quote::QuoteService;
use tracing::error;

use crate::handler::{error_response, json_response, HttpResponse, RequestHandler};

/// Path of the exchange-rate endpoint.
pub const QUOTE_PATH: &str = "/cotacao";

/// Routes `GET /cotacao` to a [`QuoteService`].
#[derive(Debug)]
pub struct QuoteRoutes {
    service: Arc<QuoteService>,
}

impl QuoteRoutes {
    /// Creates the routes over a shared service.
    pub fn new(service: Arc<QuoteService>) -> Self {
        Self { service }
    }

    async fn quote(&self, ctx: &CallContext) -> HttpResponse {
        match self.service.fetch(ctx).await {
            Ok(rate) => json_response(StatusCode::OK, &rate),
            Err(e) => {
                error!(error = %e, "exchange rate request failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        }
    }
}

#[async_trait]
impl RequestHandler for QuoteRoutes {
    async fn handle(&self, ctx: &CallContext, method: &Method, path: &str) -> HttpResponse {
        match (method, path) {
            (&Method::GET, QUOTE_PATH) => self.quote(ctx).await,
            (_, QUOTE_PATH) => {
                let mut response =
                    error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static("GET"));
                response
            }
            _ => error_response(StatusCode::NOT_FOUND, "not found"),
        }
    }
}
