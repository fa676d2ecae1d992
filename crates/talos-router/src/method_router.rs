//! Per-path method table.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to operation identifiers for a single path.
///
/// Stored as a small inline vector; a path rarely carries more than a
/// handful of methods.
///
/// # Example
///
/// ```rust
/// use talos_router::MethodRouter;
/// use http::Method;
///
/// let methods = MethodRouter::new().get("listUsers").post("createUser");
/// assert_eq!(methods.operation(&Method::GET), Some("listUsers"));
/// assert_eq!(methods.operation(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRouter {
    entries: SmallVec<[(Method, String); 4]>,
}

impl MethodRouter {
    /// Creates an empty method table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an operation to an arbitrary method.
    ///
    /// Re-binding an already registered method replaces the previous
    /// operation.
    #[must_use]
    pub fn method(mut self, method: &Method, operation: impl Into<String>) -> Self {
        let operation = operation.into();
        if let Some(entry) = self.entries.iter_mut().find(|(m, _)| m == method) {
            entry.1 = operation;
        } else {
            self.entries.push((method.clone(), operation));
        }
        self
    }

    /// Binds a GET operation.
    #[must_use]
    pub fn get(self, operation: impl Into<String>) -> Self {
        self.method(&Method::GET, operation)
    }

    /// Binds a POST operation.
    #[must_use]
    pub fn post(self, operation: impl Into<String>) -> Self {
        self.method(&Method::POST, operation)
    }

    /// Binds a PUT operation.
    #[must_use]
    pub fn put(self, operation: impl Into<String>) -> Self {
        self.method(&Method::PUT, operation)
    }

    /// Binds a DELETE operation.
    #[must_use]
    pub fn delete(self, operation: impl Into<String>) -> Self {
        self.method(&Method::DELETE, operation)
    }

    /// Binds a PATCH operation.
    #[must_use]
    pub fn patch(self, operation: impl Into<String>) -> Self {
        self.method(&Method::PATCH, operation)
    }

    /// Binds a HEAD operation.
    #[must_use]
    pub fn head(self, operation: impl Into<String>) -> Self {
        self.method(&Method::HEAD, operation)
    }

    /// Returns the operation bound to `method`, if any.
    #[must_use]
    pub fn operation(&self, method: &Method) -> Option<&str> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, op)| op.as_str())
    }

    /// Lists the methods registered on this path, for `Allow` headers.
    pub fn allowed(&self) -> impl Iterator<Item = &Method> {
        self.entries.iter().map(|(m, _)| m)
    }

    /// Returns true when no method is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Folds another table into this one. Existing bindings win.
    pub(crate) fn merge(&mut self, other: MethodRouter) {
        for (method, operation) in other.entries {
            if self.operation(&method).is_none() {
                self.entries.push((method, operation));
            }
        }
    }
}
