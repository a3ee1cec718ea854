//! # Kairos Server
//!
//! A gracefully draining HTTP server and the exchange-rate endpoint.
//!
//! - [`Server`] / [`BoundServer`] - Listener lifecycle with a bounded drain phase
//! - [`ShutdownSignal`] - Single-fire termination event, wired to SIGINT/SIGTERM
//! - [`RequestHandler`] - Per-request seam; [`QuoteRoutes`] serves `GET /cotacao`
//! - [`ServiceConfig`] - File, environment and flag configuration of the binary

#![doc(html_root_url = "https://docs.rs/kairos-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
mod handler;
mod routes;
mod server;
pub mod settings;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::{ConfigError, ConfigResult, ServerError, ServerResult};
pub use handler::{error_response, json_response, ErrorBody, HttpResponse, RequestHandler, ResponseBody};
pub use routes::{QuoteRoutes, QUOTE_PATH};
pub use server::{BoundServer, Server, ServerState};
pub use settings::ServiceConfig;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
