//! Handler registration.
//!
//! Routes and handlers are registered before the listener binds and are
//! immutable afterwards. A route binds `(host, method, path pattern)` to an
//! operation name; the operation name keys into the handler table. Keeping
//! the two separate lets several routes share one handler.

use std::collections::HashMap;

use http::Method;
use talos_core::Handler;
use talos_router::{Dispatch, HostRouter, MethodRouter};

/// Registry mapping routes to handlers.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use talos_server::HandlerRegistry;
/// use talos_core::handler_fn;
///
/// let mut registry = HandlerRegistry::new();
/// registry.register("*", Method::GET, "/health", "healthCheck", handler_fn(|_ctx, _req| async {
///     http::Response::builder()
///         .status(http::StatusCode::OK)
///         .body(http_body_util::Full::new(bytes::Bytes::from_static(b"ok")))
///         .unwrap()
/// }));
///
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    router: HostRouter,
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route and its handler.
    ///
    /// `host` is a literal hostname or `"*"` for any host. Registering the
    /// same operation name again replaces the previous handler.
    pub fn register(
        &mut self,
        host: &str,
        method: Method,
        pattern: &str,
        operation: &str,
        handler: Handler,
    ) {
        self.router
            .insert(host, pattern, MethodRouter::new().method(&method, operation));
        self.handlers.insert(operation.to_string(), handler);
    }

    /// Registers a GET route on any host.
    pub fn get(&mut self, pattern: &str, operation: &str, handler: Handler) {
        self.register("*", Method::GET, pattern, operation, handler);
    }

    /// Registers a POST route on any host.
    pub fn post(&mut self, pattern: &str, operation: &str, handler: Handler) {
        self.register("*", Method::POST, pattern, operation, handler);
    }

    /// Resolves a request against the route tables.
    #[must_use]
    pub fn lookup(&self, host: &str, method: &Method, path: &str) -> Dispatch<'_> {
        self.router.dispatch(host, method, path)
    }

    /// Returns the handler for an operation.
    #[must_use]
    pub fn handler(&self, operation: &str) -> Option<Handler> {
        self.handlers.get(operation).cloned()
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.router.len()
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.router.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("routes", &self.len())
            .field("operations", &self.handlers.len())
            .finish()
    }
}
