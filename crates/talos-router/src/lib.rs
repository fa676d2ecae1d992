//! Host-aware request routing for Talos.
//!
//! Dispatch resolves in three steps: host (exact match, then wildcard),
//! path (radix tree, static > param > catch-all), then method. The route
//! table is built once at startup and is read-only while serving, so
//! concurrent dispatch needs no locking.
//!
//! # Example
//!
//! ```rust
//! use talos_router::{Dispatch, HostRouter, MethodRouter};
//! use http::Method;
//!
//! let mut router = HostRouter::new();
//! router.insert("*", "/health", MethodRouter::new().get("healthCheck"));
//! router.insert("api.example.com", "/users/{id}", MethodRouter::new().get("getUser"));
//!
//! match router.dispatch("api.example.com", &Method::GET, "/users/42") {
//!     Dispatch::Matched(m) => {
//!         assert_eq!(m.operation, "getUser");
//!         assert_eq!(m.params.get("id"), Some("42"));
//!     }
//!     _ => panic!("expected a match"),
//! }
//! ```

mod host;
mod method_router;
mod params;
mod path_router;
mod trie;

pub use host::{Dispatch, HostRouter};
pub use method_router::MethodRouter;
pub use params::Params;
pub use path_router::PathRouter;

/// A successful route match: the operation bound to the route plus any
/// path parameters extracted along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'r> {
    /// The operation identifier the route was registered with.
    pub operation: &'r str,

    /// Extracted path parameters.
    pub params: Params,
}

impl<'r> RouteMatch<'r> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(operation: &'r str, params: Params) -> Self {
        Self { operation, params }
    }
}
