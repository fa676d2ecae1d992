//! # Talos Server
//!
//! The listener, drain, and lifecycle control for the Talos service
//! substrate.
//!
//! A service is assembled from a [`talos_config::TalosConfig`], a
//! [`HandlerRegistry`] of routes, and optionally a
//! [`talos_core::Datastore`]. The [`Lifecycle`] controller then owns the
//! whole run: it opens the datastore, binds the listener (plain TCP or
//! TLS), serves until a stop signal arrives, drains in-flight connections,
//! and closes the datastore exactly once at the end.
//!
//! ## Example
//!
//! ```rust,ignore
//! use talos_config::TalosConfig;
//! use talos_core::handler_fn;
//! use talos_server::{HandlerRegistry, Lifecycle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TalosConfig::load_profile("prod", None)?;
//!
//!     let mut registry = HandlerRegistry::new();
//!     registry.get("/health", "healthCheck", handler_fn(|_ctx, _req| async {
//!         http::Response::builder()
//!             .status(http::StatusCode::OK)
//!             .body(http_body_util::Full::new(bytes::Bytes::from_static(b"ok")))
//!             .unwrap()
//!     }));
//!
//!     Lifecycle::new(config, registry).run().await?;
//!     Ok(())
//! }
//! ```

pub mod debug;
pub mod handler;
pub mod lifecycle;
pub mod server;
pub mod shutdown;
pub mod signal;
pub mod state;
pub mod tls;

pub use handler::HandlerRegistry;
pub use lifecycle::{Lifecycle, LifecycleError};
pub use server::{BoundServer, Server, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, DrainOutcome, ShutdownSignal};
pub use signal::Signal;
pub use state::{ServerState, SharedState};
pub use tls::TlsError;
