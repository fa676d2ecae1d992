//! Extracted path parameter storage.

use smallvec::SmallVec;

/// Parameters stored inline before spilling to the heap.
///
/// Almost every route has four or fewer parameters, so matching usually
/// allocates nothing.
const INLINE_PARAMS: usize = 4;

/// Path parameters extracted during a route match, as (name, value) pairs.
///
/// # Example
///
/// ```rust
/// use talos_router::Params;
///
/// let mut params = Params::new();
/// params.push("id", "42");
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    entries: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Looks up a parameter value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no parameters were extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over (name, value) pairs in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Removes parameters added after `len`, used for backtracking.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let params = Params::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
        assert_eq!(params.get("anything"), None);
    }

    #[test]
    fn test_push_and_get() {
        let mut params = Params::new();
        params.push("user", "alice");
        params.push("doc", "readme");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("user"), Some("alice"));
        assert_eq!(params.get("doc"), Some("readme"));
    }

    #[test]
    fn test_iter_preserves_order() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");

        let collected: Vec<_> = params.iter().collect();
        assert_eq!(collected, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_truncate_backtracks() {
        let mut params = Params::new();
        params.push("keep", "1");
        let mark = params.len();
        params.push("drop", "2");
        params.truncate(mark);

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("drop"), None);
    }
}
