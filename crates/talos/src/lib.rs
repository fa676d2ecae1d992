//! # Talos
//!
//! **HTTP service lifecycle substrate**
//!
//! Talos carries a service from configuration to clean exit:
//!
//! - **Profile configuration** – JSON or TOML profiles with CLI overrides
//! - **Host-aware routing** – exact hosts plus a wildcard fallback, path
//!   parameters, and 404/405 discrimination
//! - **Fixed middleware pipeline** – status counting, redacted access
//!   logging, and panic recovery on every request
//! - **Plain or TLS listener** – both-or-neither certificate rules, never a
//!   silent downgrade
//! - **Graceful shutdown** – SIGINT/SIGQUIT/SIGTERM start a bounded drain,
//!   and the datastore closes exactly once after the last request
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use talos::prelude::*;
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

pub use talos_config as config;
pub use talos_core as core;
pub use talos_middleware as middleware;
pub use talos_router as router;
pub use talos_server as server;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use talos_config::TalosConfig;
    pub use talos_core::{handler_fn, Datastore, Handler, Request, RequestContext, Response};
    pub use talos_middleware::ResponseExt;
    pub use talos_router::Params;
    pub use talos_server::{HandlerRegistry, Lifecycle, ServerState, ShutdownSignal};
}
