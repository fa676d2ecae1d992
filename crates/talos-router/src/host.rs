//! Host-level dispatch.

use std::collections::HashMap;

use http::Method;

use crate::method_router::MethodRouter;
use crate::path_router::PathRouter;
use crate::RouteMatch;

/// Outcome of a full (host, method, path) dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<'r> {
    /// A handler operation was found.
    Matched(RouteMatch<'r>),

    /// No host table or no path matched. Maps to 404.
    NotFound,

    /// The path matched but the method is not bound. Carries the allowed
    /// methods for the `Allow` header. Maps to 405.
    MethodNotAllowed(Vec<Method>),
}

/// Top-level router resolving host before path.
///
/// Hosts are matched exactly on the `Host` header value (port stripped);
/// routes registered under `"*"` form the fallback table consulted when no
/// exact host matches.
#[derive(Debug, Clone, Default)]
pub struct HostRouter {
    hosts: HashMap<String, PathRouter>,
    fallback: PathRouter,
}

impl HostRouter {
    /// Creates an empty host router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route under a host pattern.
    ///
    /// `host` is either a literal hostname or `"*"` for the fallback table.
    pub fn insert(&mut self, host: &str, pattern: &str, methods: MethodRouter) {
        if host == "*" {
            self.fallback.insert(pattern, methods);
        } else {
            self.hosts
                .entry(host.to_ascii_lowercase())
                .or_default()
                .insert(pattern, methods);
        }
    }

    /// Resolves a request to a handler operation.
    ///
    /// Host first (exact, then wildcard), then path, then method. Never
    /// faults: unresolvable requests come back as `NotFound` or
    /// `MethodNotAllowed`.
    #[must_use]
    pub fn dispatch(&self, host: &str, method: &Method, path: &str) -> Dispatch<'_> {
        let table = self.table_for(host);

        let Some((methods, params)) = table.at(path) else {
            return Dispatch::NotFound;
        };

        match methods.operation(method) {
            Some(operation) => Dispatch::Matched(RouteMatch::new(operation, params)),
            None => Dispatch::MethodNotAllowed(methods.allowed().cloned().collect()),
        }
    }

    /// Total number of registered routes across all host tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fallback.len() + self.hosts.values().map(PathRouter::len).sum::<usize>()
    }

    /// Returns true when no routes are registered anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table_for(&self, host: &str) -> &PathRouter {
        let bare = host.rsplit_once(':').map_or(host, |(h, _)| h);
        self.hosts
            .get(&bare.to_ascii_lowercase())
            .unwrap_or(&self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HostRouter {
        let mut router = HostRouter::new();
        router.insert("*", "/health", MethodRouter::new().get("healthCheck"));
        router.insert(
            "api.example.com",
            "/users",
            MethodRouter::new().get("listUsers").post("createUser"),
        );
        router
    }

    #[test]
    fn test_exact_host_match() {
        let router = sample();
        match router.dispatch("api.example.com", &Method::GET, "/users") {
            Dispatch::Matched(m) => assert_eq!(m.operation, "listUsers"),
            other => panic!("unexpected dispatch: {other:?}"),
        }
    }

    #[test]
    fn test_host_with_port_stripped() {
        let router = sample();
        assert!(matches!(
            router.dispatch("api.example.com:8443", &Method::GET, "/users"),
            Dispatch::Matched(_)
        ));
    }

    #[test]
    fn test_host_case_insensitive() {
        let router = sample();
        assert!(matches!(
            router.dispatch("API.Example.COM", &Method::GET, "/users"),
            Dispatch::Matched(_)
        ));
    }

    #[test]
    fn test_unknown_host_falls_back_to_wildcard() {
        let router = sample();
        match router.dispatch("other.example.com", &Method::GET, "/health") {
            Dispatch::Matched(m) => assert_eq!(m.operation, "healthCheck"),
            other => panic!("unexpected dispatch: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_host_unknown_path_is_not_found() {
        let router = sample();
        assert_eq!(
            router.dispatch("other.example.com", &Method::GET, "/users"),
            Dispatch::NotFound
        );
    }

    #[test]
    fn test_method_not_allowed_carries_allow_list() {
        let router = sample();
        match router.dispatch("api.example.com", &Method::DELETE, "/users") {
            Dispatch::MethodNotAllowed(allowed) => {
                assert!(allowed.contains(&Method::GET));
                assert!(allowed.contains(&Method::POST));
            }
            other => panic!("unexpected dispatch: {other:?}"),
        }
    }

    #[test]
    fn test_unmatched_path_on_known_host() {
        let router = sample();
        assert_eq!(
            router.dispatch("api.example.com", &Method::GET, "/missing"),
            Dispatch::NotFound
        );
    }

    #[test]
    fn test_len_spans_tables() {
        let router = sample();
        assert_eq!(router.len(), 2);
        assert!(!router.is_empty());
    }
}
