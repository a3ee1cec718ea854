//! HTTP server with graceful, deadline-bounded draining.
//!
//! Lifecycle: `Starting → Serving → Draining → Stopped`.
//!
//! - Binding moves `Starting → Serving`; a bind failure is returned at once.
//! - Each accepted connection runs on its own task.
//! - The first shutdown signal stops the accept loop and asks every open
//!   connection to finish its current request and close.
//! - Draining waits for open connections up to the configured deadline. If
//!   the deadline elapses first, the in-flight cancellation fires and
//!   [`ServerError::ShutdownTimeout`] is returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use kairos_server::{Server, ServerConfig, ShutdownSignal};
//!
//! let server = Server::new(ServerConfig::default(), handler).bind().await?;
//! println!("listening on {}", server.local_addr());
//! server.serve(ShutdownSignal::with_os_signals()).await?;
//! ```

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use kairos_core::{CallContext, Cancellation};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HttpResponse, RequestHandler};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Lifecycle state of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Not yet bound.
    Starting,
    /// Accepting connections.
    Serving,
    /// No longer accepting; waiting for open connections.
    Draining,
    /// Finished.
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "starting",
            Self::Serving => "serving",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// An unbound server.
pub struct Server {
    config: ServerConfig,
    handler: Arc<dyn RequestHandler>,
    state: watch::Sender<ServerState>,
}

impl Server {
    /// Creates a server that dispatches every request to `handler`.
    pub fn new(config: ServerConfig, handler: Arc<dyn RequestHandler>) -> Self {
        let (state, _) = watch::channel(ServerState::Starting);
        Self {
            config,
            handler,
            state,
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Observes lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// [`ServerError::Bind`] if the address is invalid or unavailable.
    pub async fn bind(self) -> ServerResult<BoundServer> {
        let addr = self.config.socket_addr()?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind to {addr}: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Io(e.to_string()))?;

        self.state.send_replace(ServerState::Serving);
        info!(%local_addr, "server listening");

        Ok(BoundServer {
            listener,
            local_addr,
            config: self.config,
            handler: self.handler,
            state: self.state,
        })
    }

    /// Binds, then serves until `shutdown` fires and draining completes.
    pub async fn run(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        self.bind().await?.serve(shutdown).await
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// A server whose listener is bound and accepting.
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
    handler: Arc<dyn RequestHandler>,
    state: watch::Sender<ServerState>,
}

impl BoundServer {
    /// The address actually bound (resolves port `0`).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Observes lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Serves until `shutdown` fires, then drains.
    ///
    /// # Errors
    ///
    /// [`ServerError::ShutdownTimeout`] if connections are still open when
    /// the drain deadline elapses.
    pub async fn serve(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let Self {
            listener,
            local_addr,
            config,
            handler,
            state,
        } = self;

        let tracker = ConnectionTracker::new();
        let inflight = Cancellation::new();

        loop {
            tokio::select! {
                biased;

                () = shutdown.recv() => {
                    info!("shutdown signal received, no longer accepting connections");
                    break;
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let token = tracker.acquire();
                        let handler = Arc::clone(&handler);
                        let shutdown = shutdown.clone();
                        let inflight = inflight.clone();

                        tokio::spawn(async move {
                            serve_connection(stream, remote_addr, handler, shutdown, inflight).await;
                            drop(token);
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                    }
                },
            }
        }

        drop(listener);
        state.send_replace(ServerState::Draining);

        let drain_timeout = config.shutdown_timeout();
        info!(
            %local_addr,
            active = tracker.active_connections(),
            timeout_ms = drain_timeout.as_millis() as u64,
            "draining connections"
        );

        let drained = tokio::time::timeout(drain_timeout, tracker.wait_for_idle()).await;
        let result = match drained {
            Ok(()) => {
                info!("all connections closed");
                Ok(())
            }
            Err(_) => {
                let active = tracker.active_connections();
                warn!(active, "drain deadline elapsed, cancelling in-flight work");
                inflight.cancel();
                Err(ServerError::ShutdownTimeout { active })
            }
        };

        state.send_replace(ServerState::Stopped);
        info!("server stopped");
        result
    }
}

impl fmt::Debug for BoundServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundServer")
            .field("local_addr", &self.local_addr)
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Serves one connection until it closes, shutdown completes it, or
/// in-flight work is cancelled.
async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    handler: Arc<dyn RequestHandler>,
    shutdown: ShutdownSignal,
    inflight: Cancellation,
) {
    let io = TokioIo::new(stream);
    let dispatch_cancel = inflight.clone();
    let service = service_fn(move |req: Request<Incoming>| {
        let handler = Arc::clone(&handler);
        let inflight = dispatch_cancel.clone();
        async move { Ok::<_, Infallible>(dispatch(handler, inflight, req).await) }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                debug!(%remote_addr, error = %e, "connection error");
            }
        }
        () = shutdown.recv() => {
            // Finish the current request, then close
            conn.as_mut().graceful_shutdown();
            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(e) = result {
                        debug!(%remote_addr, error = %e, "connection error while draining");
                    }
                }
                () = inflight.cancelled() => {
                    debug!(%remote_addr, "connection dropped at drain deadline");
                }
            }
        }
    }
}

/// Runs one request inside its own span and cancellation-bound context.
async fn dispatch(
    handler: Arc<dyn RequestHandler>,
    inflight: Cancellation,
    req: Request<Incoming>,
) -> HttpResponse {
    let request_id = Uuid::now_v7();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    drop(req);

    let span = info_span!("request", %request_id, %method, %path);
    async move {
        let started = Instant::now();
        // Cancelling one request leaves its neighbours running
        let ctx = CallContext::with_cancellation(inflight.child());
        let response = handler.handle(&ctx, &method, &path).await;
        info!(
            http.status_code = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );
        response
    }
    .instrument(span)
    .await
}
