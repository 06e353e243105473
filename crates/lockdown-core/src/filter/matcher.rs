//! Suffix matcher implementation

use std::collections::BTreeSet;

/// Matcher over a borrowed pattern set
#[derive(Debug, Clone, Copy)]
pub struct DomainMatcher<'a> {
    patterns: &'a BTreeSet<String>,
}

impl<'a> DomainMatcher<'a> {
    /// Wrap a pattern set
    pub fn new(patterns: &'a BTreeSet<String>) -> Self {
        Self { patterns }
    }

    /// Return the pattern `host` matches, if any
    ///
    /// Walks the host's parent suffixes, so the cost depends on the number
    /// of labels rather than the number of patterns.
    pub fn find_match(&self, host: &str) -> Option<&'a str> {
        if let Some(pattern) = self.patterns.get(host) {
            return Some(pattern.as_str());
        }

        // "a.b.c" ends with ".p" exactly when p is "b.c" or "c"
        let mut current = host;
        while let Some(pos) = current.find('.') {
            current = &current[pos + 1..];
            if let Some(pattern) = self.patterns.get(current) {
                return Some(pattern.as_str());
            }
        }

        None
    }

    /// Check if `host` matches any pattern
    pub fn matches(&self, host: &str) -> bool {
        self.find_match(host).is_some()
    }

    /// Number of patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if there are no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Check if `host` matches any of `patterns`
pub fn matches(host: &str, patterns: &BTreeSet<String>) -> bool {
    DomainMatcher::new(patterns).matches(host)
}

/// Return the pattern in `patterns` that `host` matches, if any
pub fn find_match<'a>(host: &str, patterns: &'a BTreeSet<String>) -> Option<&'a str> {
    DomainMatcher::new(patterns).find_match(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> BTreeSet<String> {
        patterns.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_exact_match() {
        let patterns = set(&["example.com"]);
        assert!(matches("example.com", &patterns));
        assert!(!matches("other.com", &patterns));
    }

    #[test]
    fn test_subdomain_match() {
        let patterns = set(&["ads.example.com"]);
        assert!(matches("x.ads.example.com", &patterns));
        assert!(matches("deep.x.ads.example.com", &patterns));
        assert!(!matches("shop.example.com", &patterns));
        assert!(!matches("example.com", &patterns));
    }

    #[test]
    fn test_label_boundary() {
        let patterns = set(&["example.com"]);
        assert!(!matches("badexample.com", &patterns));
        assert!(!matches("example.com.evil.net", &patterns));
    }

    #[test]
    fn test_wildcard_is_literal() {
        let patterns = set(&["*.example.com"]);
        // No expansion at match time
        assert!(!matches("sub.example.com", &patterns));
        assert!(!matches("example.com", &patterns));
        assert!(matches("*.example.com", &patterns));
        assert!(matches("x.*.example.com", &patterns));
    }

    #[test]
    fn test_case_sensitive() {
        let patterns = set(&["example.com"]);
        assert!(!matches("EXAMPLE.COM", &patterns));
        assert!(!matches("Sub.Example.com", &patterns));
    }

    #[test]
    fn test_find_match_returns_pattern() {
        let patterns = set(&["tracker.net", "ads.example.com"]);
        assert_eq!(find_match("a.tracker.net", &patterns), Some("tracker.net"));
        assert_eq!(find_match("ads.example.com", &patterns), Some("ads.example.com"));
        assert_eq!(find_match("example.com", &patterns), None);
    }

    #[test]
    fn test_empty_patterns() {
        let patterns = BTreeSet::new();
        let matcher = DomainMatcher::new(&patterns);
        assert!(matcher.is_empty());
        assert!(!matcher.matches("anything.com"));
        assert!(!matcher.matches(""));
    }

    #[test]
    fn test_trailing_dot_host() {
        // "example.com." ends with ".": the suffix after the last dot is empty
        let patterns = set(&[""]);
        assert!(matches("example.com.", &patterns));
        assert!(matches("", &patterns));
    }
}
