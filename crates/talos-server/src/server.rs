//! The listener and per-request dispatch.
//!
//! Binding is two-phase: [`Server::bind`] resolves configuration, loads TLS
//! material, and binds the TCP listener, surfacing every failure before a
//! single request is accepted. [`BoundServer::serve`] then runs the accept
//! loop until shutdown and drains in-flight connections.
//!
//! Every request, including 404s and 405s, flows through the middleware
//! pipeline so it is counted and logged uniformly.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

use talos_config::{ConfigError, TalosConfig};
use talos_core::Response;
use talos_middleware::{Pipeline, Redactor, ResponseExt, StatusCounters};
use talos_router::Dispatch;

use crate::handler::HandlerRegistry;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::state::{ServerState, SharedState};
use crate::tls::{self, TlsError};
use crate::{debug, DrainOutcome};

/// Errors that prevent the listener from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configuration did not resolve to a usable listener.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// TLS material could not be loaded.
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// The TCP listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that failed to bind.
        addr: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// The HTTP server before binding.
pub struct Server {
    config: TalosConfig,
    registry: Arc<HandlerRegistry>,
    pipeline: Pipeline,
    state: SharedState,
    started_at: Instant,
}

impl Server {
    /// Creates a server from configuration and a populated registry.
    #[must_use]
    pub fn new(config: TalosConfig, registry: HandlerRegistry, state: SharedState) -> Self {
        let pipeline = Pipeline::new(Redactor::new(config.redaction_marker.clone()));
        Self {
            config,
            registry: Arc::new(registry),
            pipeline,
            state,
            started_at: Instant::now(),
        }
    }

    /// The response counters fed by the pipeline.
    #[must_use]
    pub fn counters(&self) -> Arc<StatusCounters> {
        self.pipeline.counters()
    }

    /// Resolves configuration and binds the listener.
    ///
    /// TLS, when configured, is loaded here: a bad certificate or key stops
    /// startup instead of downgrading to plaintext.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable listen address, unusable TLS material, or a
    /// bind failure.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let addr = self.config.socket_addr()?;
        let tls = match self.config.tls_settings()? {
            Some(settings) => Some(tls::build_acceptor(&settings)?),
            None => None,
        };

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!(addr = %local_addr, tls = tls.is_some(), "listener bound");

        Ok(BoundServer {
            inner: Arc::new(self),
            listener,
            tls,
            local_addr,
        })
    }

    /// Handles one HTTP exchange.
    async fn handle_request(
        self: &Arc<Self>,
        remote: SocketAddr,
        request: http::Request<Incoming>,
    ) -> Result<Response, Infallible> {
        let (parts, body) = request.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                tracing::debug!(remote = %remote, error = %e, "failed to read request body");
                // Still one counted, logged response like any other outcome.
                let request = http::Request::from_parts(parts, Full::new(Bytes::new()));
                let response = self
                    .pipeline
                    .process(Some(remote), request, |_ctx, _req| {
                        Box::pin(async {
                            Response::json_error(
                                StatusCode::BAD_REQUEST,
                                "BAD_REQUEST",
                                "failed to read request body",
                            )
                        })
                    })
                    .await;
                return Ok(response);
            }
        };
        let request = http::Request::from_parts(parts, Full::new(bytes));

        if self.config.debug_endpoints
            && request.method() == Method::GET
            && request.uri().path() == "/debug/vars"
        {
            return Ok(debug::vars_response(
                &self.state,
                &self.pipeline.counters(),
                self.started_at,
                self.registry.len(),
            ));
        }

        let host = request
            .headers()
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let response = match self.registry.lookup(&host, &method, &path) {
            Dispatch::Matched(matched) => {
                let operation = matched.operation.to_string();
                let params = matched.params;
                if let Some(handler) = self.registry.handler(&operation) {
                    let mut request = request;
                    request.extensions_mut().insert(params);
                    self.pipeline
                        .process(Some(remote), request, move |ctx, req| {
                            handler(ctx.clone(), req)
                        })
                        .await
                } else {
                    // A route without a handler is a registration bug.
                    tracing::error!(operation = %operation, "matched route has no handler");
                    self.pipeline
                        .process(Some(remote), request, |_ctx, _req| {
                            Box::pin(async {
                                Response::json_error(
                                    StatusCode::INTERNAL_SERVER_ERROR,
                                    "NO_HANDLER",
                                    "operation has no handler",
                                )
                            })
                        })
                        .await
                }
            }
            Dispatch::MethodNotAllowed(allowed) => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                self.pipeline
                    .process(Some(remote), request, move |_ctx, _req| {
                        Box::pin(async move {
                            let mut response = Response::json_error(
                                StatusCode::METHOD_NOT_ALLOWED,
                                "METHOD_NOT_ALLOWED",
                                "method not bound on this path",
                            );
                            if let Ok(value) = http::HeaderValue::from_str(&allow) {
                                response.headers_mut().insert(http::header::ALLOW, value);
                            }
                            response
                        })
                    })
                    .await
            }
            Dispatch::NotFound => {
                self.pipeline
                    .process(Some(remote), request, |_ctx, _req| {
                        Box::pin(async {
                            Response::json_error(
                                StatusCode::NOT_FOUND,
                                "NOT_FOUND",
                                "no route for this path",
                            )
                        })
                    })
                    .await
            }
        };

        Ok(response)
    }

    /// Serves one connection over an established byte stream.
    async fn serve_io<I>(self: Arc<Self>, io: I, remote: SocketAddr, shutdown: ShutdownSignal)
    where
        I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let server = Arc::clone(&self);
        let service = service_fn(move |req: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { server.handle_request(remote, req).await }
        });

        let conn = http1::Builder::new().serve_connection(TokioIo::new(io), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(remote = %remote, error = %e, "connection error");
                }
            }
            () = shutdown.recv() => {
                // Stop taking new requests on this connection but let the
                // current exchange finish.
                conn.as_mut().graceful_shutdown();
                if let Err(e) = conn.as_mut().await {
                    tracing::debug!(remote = %remote, error = %e, "connection error during drain");
                }
            }
        }
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote: SocketAddr,
        tls: Option<TlsAcceptor>,
        shutdown: ShutdownSignal,
    ) {
        match tls {
            Some(acceptor) => match acceptor.accept(stream).await {
                Ok(tls_stream) => self.serve_io(tls_stream, remote, shutdown).await,
                Err(e) => {
                    tracing::debug!(remote = %remote, error = %e, "TLS handshake failed");
                }
            },
            None => self.serve_io(stream, remote, shutdown).await,
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listen", &self.config.listen)
            .field("routes", &self.registry.len())
            .field("state", &self.state.current())
            .finish_non_exhaustive()
    }
}

/// A server whose listener is bound and ready to accept.
pub struct BoundServer {
    inner: Arc<Server>,
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
    local_addr: SocketAddr,
}

impl BoundServer {
    /// The address the listener actually bound, with the resolved port.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The response counters fed by the pipeline.
    #[must_use]
    pub fn counters(&self) -> Arc<StatusCounters> {
        self.inner.counters()
    }

    /// Accepts connections until `shutdown` fires, then drains.
    ///
    /// The drain waits for in-flight connections up to the configured
    /// deadline; `forced` cuts it short immediately.
    pub async fn serve(self, shutdown: ShutdownSignal, forced: ShutdownSignal) -> DrainOutcome {
        let Self {
            inner,
            listener,
            tls,
            local_addr,
        } = self;

        inner.state.advance(ServerState::Serving);
        tracing::info!(addr = %local_addr, "serving");

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let token = tracker.acquire();
                        let server = Arc::clone(&inner);
                        let tls = tls.clone();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            server.handle_connection(stream, remote, tls, shutdown).await;
                            drop(token);
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                () = shutdown.recv() => break,
            }
        }

        // Closing the listener refuses new connections while in-flight
        // requests finish.
        drop(listener);
        inner.state.advance(ServerState::Draining);

        let deadline = inner.config.drain_deadline();
        tracing::info!(active = tracker.active(), deadline = ?deadline, "draining");

        let outcome = tokio::select! {
            () = tracker.drained() => DrainOutcome::Completed,
            () = forced.recv() => DrainOutcome::Forced {
                abandoned: tracker.active(),
            },
            () = async {
                match deadline {
                    Some(limit) => tokio::time::sleep(limit).await,
                    None => std::future::pending().await,
                }
            } => DrainOutcome::DeadlineExpired {
                abandoned: tracker.active(),
            },
        };

        tracing::info!(outcome = ?outcome, "listener stopped");
        outcome
    }
}

impl std::fmt::Debug for BoundServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundServer")
            .field("local_addr", &self.local_addr)
            .field("tls", &self.tls.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TalosConfig {
        TalosConfig {
            listen: "127.0.0.1:0".to_string(),
            ..TalosConfig::default()
        }
    }

    #[tokio::test]
    async fn test_bind_resolves_ephemeral_port() {
        let server = Server::new(test_config(), HandlerRegistry::new(), SharedState::new());
        let bound = server.bind().await.unwrap();
        assert_ne!(bound.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_listen_addr() {
        let config = TalosConfig {
            listen: "not-an-address".to_string(),
            ..TalosConfig::default()
        };
        let server = Server::new(config, HandlerRegistry::new(), SharedState::new());
        assert!(matches!(
            server.bind().await,
            Err(ServerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_bind_rejects_partial_tls() {
        let config = TalosConfig {
            listen: "127.0.0.1:0".to_string(),
            cert: Some("/tmp/cert.pem".into()),
            ..TalosConfig::default()
        };
        let server = Server::new(config, HandlerRegistry::new(), SharedState::new());
        assert!(matches!(
            server.bind().await,
            Err(ServerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_bind_rejects_missing_tls_files() {
        let config = TalosConfig {
            listen: "127.0.0.1:0".to_string(),
            cert: Some("/nonexistent/cert.pem".into()),
            key: Some("/nonexistent/key.pem".into()),
            ..TalosConfig::default()
        };
        let server = Server::new(config, HandlerRegistry::new(), SharedState::new());
        assert!(matches!(server.bind().await, Err(ServerError::Tls(_))));
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let state = SharedState::new();
        let server = Server::new(test_config(), HandlerRegistry::new(), state.clone());
        let bound = server.bind().await.unwrap();

        let shutdown = ShutdownSignal::new();
        let forced = ShutdownSignal::new();
        let trigger = shutdown.clone();

        let handle = tokio::spawn(bound.serve(shutdown, forced));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(state.current(), ServerState::Serving);

        trigger.trigger();
        let outcome = tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("serve should stop")
            .expect("serve task should not panic");

        assert_eq!(outcome, DrainOutcome::Completed);
        assert_eq!(state.current(), ServerState::Draining);
    }
}
