//! Host matching against rule patterns
//!
//! A host matches a pattern when it is equal to the pattern or ends with
//! `"." + pattern`. Patterns are literal strings: a leading `*.` is not
//! expanded, it only matches hosts that literally carry it. Subdomain
//! coverage for two-label domains comes from the wildcard entries the rule
//! store adds, and deeper domains cover their subdomains through the suffix
//! rule itself. Matching is case-sensitive.

mod matcher;

pub use matcher::{find_match, matches, DomainMatcher};
