//! Log-line secret redaction.

/// Replacement text substituted for redacted spans.
pub const REDACTED: &str = "[REDACTED]";

/// Scrubs a configured marker out of log lines before they are emitted.
///
/// Matching is a plain case-sensitive substring search; every occurrence is
/// replaced. An empty marker disables redaction.
///
/// # Example
///
/// ```rust
/// use talos_middleware::Redactor;
///
/// let redactor = Redactor::new("SECRET");
/// assert_eq!(
///     redactor.scrub("token=SECRET123 path=/login"),
///     "token=[REDACTED]123 path=/login"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Redactor {
    marker: String,
}

impl Redactor {
    /// Creates a redactor for the given marker.
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Returns the configured marker.
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Replaces every occurrence of the marker in `line`.
    ///
    /// Borrows the input unchanged when nothing matches, so the common case
    /// allocates nothing.
    #[must_use]
    pub fn scrub<'a>(&self, line: &'a str) -> std::borrow::Cow<'a, str> {
        if self.marker.is_empty() || !line.contains(&self.marker) {
            std::borrow::Cow::Borrowed(line)
        } else {
            std::borrow::Cow::Owned(line.replace(&self.marker, REDACTED))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_borrows() {
        let redactor = Redactor::new("SECRET");
        let line = "GET /health 200";
        assert!(matches!(
            redactor.scrub(line),
            std::borrow::Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let redactor = Redactor::new("SECRET");
        assert_eq!(
            redactor.scrub("a=SECRET b=SECRET"),
            "a=[REDACTED] b=[REDACTED]"
        );
    }

    #[test]
    fn test_partial_overlap_untouched() {
        let redactor = Redactor::new("SECRET");
        assert_eq!(redactor.scrub("SECRE T"), "SECRE T");
    }

    #[test]
    fn test_empty_marker_disables_redaction() {
        let redactor = Redactor::new("");
        assert_eq!(redactor.scrub("anything SECRET"), "anything SECRET");
    }
}
