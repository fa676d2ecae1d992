//! Single-host path router.

use http::Method;

use crate::method_router::MethodRouter;
use crate::params::Params;
use crate::trie::Node;
use crate::RouteMatch;

/// Routes paths within one host table.
///
/// Patterns support literal segments, `{name}` parameters, and a trailing
/// `*name` catch-all. Registration happens only during initialization;
/// matching is read-only and lock-free.
#[derive(Debug, Clone)]
pub struct PathRouter {
    root: Node,
    route_count: usize,
}

impl Default for PathRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl PathRouter {
    /// Creates an empty path router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers a pattern with its method table.
    pub fn insert(&mut self, pattern: &str, methods: MethodRouter) {
        self.root.insert(pattern, methods);
        self.route_count += 1;
    }

    /// Matches a path regardless of method.
    ///
    /// Useful for distinguishing "no such path" from "path exists but the
    /// method is wrong" when producing 404 vs 405.
    #[must_use]
    pub fn at(&self, path: &str) -> Option<(&MethodRouter, Params)> {
        self.root.find(path)
    }

    /// Matches a path and method together.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let (methods, params) = self.at(path)?;
        let operation = methods.operation(method)?;
        Some(RouteMatch::new(operation, params))
    }

    /// Number of registered patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true when no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_route() {
        let mut router = PathRouter::new();
        router.insert("/users/{id}", MethodRouter::new().get("getUser"));

        let m = router.match_route(&Method::GET, "/users/9").unwrap();
        assert_eq!(m.operation, "getUser");
        assert_eq!(m.params.get("id"), Some("9"));
    }

    #[test]
    fn test_method_mismatch_still_matches_path() {
        let mut router = PathRouter::new();
        router.insert("/users", MethodRouter::new().get("listUsers"));

        assert!(router.match_route(&Method::POST, "/users").is_none());
        assert!(router.at("/users").is_some());
    }

    #[test]
    fn test_len() {
        let mut router = PathRouter::new();
        assert!(router.is_empty());
        router.insert("/a", MethodRouter::new().get("a"));
        router.insert("/b", MethodRouter::new().get("b"));
        assert_eq!(router.len(), 2);
    }
}
