//! Scope patterns: deciding which event categories a subscriber receives.

use regex::Regex;

use crate::errors::NotifyError;

/// A subscriber's compiled scope pattern.
///
/// The pattern is compiled once at subscribe time. A declared scope of
/// exactly `*` matches every event category, including an empty one; any
/// other scope is a regular expression tested unanchored against the
/// category, so a plain prefix or infix also matches. Authors who want an
/// exact match anchor the pattern themselves (`^pre-process-failed$`).
#[derive(Debug, Clone)]
pub struct ScopePattern {
    raw: String,
    // None means the `*` wildcard.
    regex: Option<Regex>,
}

impl ScopePattern {
    /// Compiles a scope pattern.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Scope`] when the pattern is not a valid
    /// regular expression.
    pub fn new(raw: impl Into<String>) -> Result<Self, NotifyError> {
        let raw = raw.into();
        if raw == "*" {
            return Ok(Self { raw, regex: None });
        }
        let regex = Regex::new(&raw).map_err(|source| NotifyError::Scope {
            pattern: raw.clone(),
            source,
        })?;
        Ok(Self {
            raw,
            regex: Some(regex),
        })
    }

    /// Returns the pattern as declared at subscribe time.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Tests an event category against this pattern.
    #[must_use]
    pub fn matches(&self, scope: &str) -> bool {
        match &self.regex {
            None => true,
            Some(regex) => regex.is_match(scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_every_category() {
        let pattern = ScopePattern::new("*").unwrap();
        assert!(pattern.matches("process-succeeded"));
        assert!(pattern.matches("main-process-failed"));
        assert!(pattern.matches(""));
    }

    #[test]
    fn unanchored_pattern_matches_as_infix() {
        let pattern = ScopePattern::new("process-failed").unwrap();
        assert!(pattern.matches("pre-process-failed"));
        assert!(pattern.matches("main-process-failed"));
        assert!(!pattern.matches("process-succeeded"));
    }

    #[test]
    fn anchored_pattern_matches_only_the_literal() {
        let pattern = ScopePattern::new("^pre-process-failed$").unwrap();
        assert!(pattern.matches("pre-process-failed"));
        assert!(!pattern.matches("a-pre-process-failed"));
        assert!(!pattern.matches("pre-process-failed-again"));
    }

    #[test]
    fn prefix_pattern_matches() {
        let pattern = ScopePattern::new("main-").unwrap();
        assert!(pattern.matches("main-process-failed"));
        assert!(!pattern.matches("pre-process-failed"));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = ScopePattern::new("(unclosed").unwrap_err();
        assert!(matches!(err, NotifyError::Scope { .. }));
    }
}
