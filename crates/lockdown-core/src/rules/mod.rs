//! Rule storage and merging
//!
//! Combines the vendor rule set with the user's overrides into the pattern
//! sets the matcher consumes:
//! - Block set: enabled vendor group domains plus user lockdown domains
//! - Allow set: vendor whitelist plus user whitelist
//! - Block routes: IPv4/IPv6 ranges of enabled vendor groups
//!
//! Vendor and user entries are plain unions; neither source takes
//! precedence. Sets are rebuilt from a fresh settings snapshot on every
//! call, so changes made by the host app apply to the next request.

mod ruleset;

pub use ruleset::{IpRange, Ipv4Route, Ipv6Route, RuleGroup, RuleSet};

use crate::settings::{keys, SettingsStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Read-only view of the merged rules
pub trait RuleStore: Send + Sync {
    /// Patterns whose hosts are blocked
    fn merged_block_domains(&self) -> BTreeSet<String>;

    /// IPv4 ranges routed into the tunnel for blocking
    fn merged_block_ipv4_routes(&self) -> Vec<Ipv4Route>;

    /// IPv6 ranges routed into the tunnel for blocking
    fn merged_block_ipv6_routes(&self) -> Vec<Ipv6Route>;

    /// Patterns whose hosts are allowed
    fn merged_allow_domains(&self) -> BTreeSet<String>;
}

/// Insert a rule key and, for two-label domains, its subdomain wildcard
///
/// `"foo.com"` yields `"foo.com"` and `"*.foo.com"`; any other key is kept
/// as is.
pub fn insert_pattern(patterns: &mut BTreeSet<String>, key: &str) {
    patterns.insert(key.to_string());
    if key.matches('.').count() == 1 {
        patterns.insert(format!("*.{key}"));
    }
}

fn insert_enabled(patterns: &mut BTreeSet<String>, overrides: &BTreeMap<String, bool>) {
    for (domain, _) in overrides.iter().filter(|(_, enabled)| **enabled) {
        insert_pattern(patterns, domain);
    }
}

/// Rule store backed by the shared settings
#[derive(Clone)]
pub struct SettingsRuleStore {
    store: Arc<dyn SettingsStore>,
}

impl SettingsRuleStore {
    /// Create a rule store reading from `store`
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Current vendor rule set
    pub fn vendor_rules(&self) -> RuleSet {
        RuleSet::decode(self.store.get(keys::LOCKDOWN_DEFAULTS))
    }

    /// Current user block overrides
    pub fn user_lockdown(&self) -> BTreeMap<String, bool> {
        self.store.bool_map(keys::USER_LOCKDOWN_DOMAINS)
    }

    /// Current vendor allow list
    pub fn vendor_whitelist(&self) -> BTreeMap<String, bool> {
        self.store.bool_map(keys::CONFIRMED_WHITELISTED_DOMAINS)
    }

    /// Current user allow list
    pub fn user_whitelist(&self) -> BTreeMap<String, bool> {
        self.store.bool_map(keys::USER_WHITELISTED_DOMAINS)
    }
}

impl std::fmt::Debug for SettingsRuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsRuleStore").finish_non_exhaustive()
    }
}

impl RuleStore for SettingsRuleStore {
    fn merged_block_domains(&self) -> BTreeSet<String> {
        let mut patterns = BTreeSet::new();
        for domain in self.vendor_rules().blocked_domains() {
            insert_pattern(&mut patterns, domain);
        }
        insert_enabled(&mut patterns, &self.user_lockdown());
        patterns
    }

    fn merged_block_ipv4_routes(&self) -> Vec<Ipv4Route> {
        self.vendor_rules().ipv4_routes()
    }

    fn merged_block_ipv6_routes(&self) -> Vec<Ipv6Route> {
        self.vendor_rules().ipv6_routes()
    }

    fn merged_allow_domains(&self) -> BTreeSet<String> {
        let mut patterns = BTreeSet::new();
        insert_enabled(&mut patterns, &self.vendor_whitelist());
        insert_enabled(&mut patterns, &self.user_whitelist());
        patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryStore;
    use serde_json::json;

    fn store_with(entries: Vec<(&str, serde_json::Value)>) -> SettingsRuleStore {
        let store = Arc::new(MemoryStore::new());
        store.set_many(entries).unwrap();
        SettingsRuleStore::new(store)
    }

    #[test]
    fn test_two_label_key_gets_wildcard() {
        let mut patterns = BTreeSet::new();
        insert_pattern(&mut patterns, "example.com");
        assert!(patterns.contains("example.com"));
        assert!(patterns.contains("*.example.com"));
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn test_deeper_key_is_literal() {
        let mut patterns = BTreeSet::new();
        insert_pattern(&mut patterns, "sub.example.com");
        assert_eq!(patterns.into_iter().collect::<Vec<_>>(), vec!["sub.example.com"]);
    }

    #[test]
    fn test_single_label_key_is_literal() {
        let mut patterns = BTreeSet::new();
        insert_pattern(&mut patterns, "localhost");
        assert_eq!(patterns.len(), 1);
    }

    #[test]
    fn test_block_set_unions_vendor_and_user() {
        let rules = store_with(vec![
            (
                keys::LOCKDOWN_DEFAULTS,
                json!({ "lockdownDefaults": {
                    "ads": { "enabled": true, "domains": { "ads.example.com": true, "skip.example.com": false } },
                    "off": { "enabled": false, "domains": { "off.example.com": true } }
                }}),
            ),
            (
                keys::USER_LOCKDOWN_DOMAINS,
                json!({ "tracker.io": true, "disabled.io": false, "loose.io": "yes" }),
            ),
        ]);

        let blocked = rules.merged_block_domains();
        let expected: BTreeSet<String> = ["ads.example.com", "tracker.io", "*.tracker.io"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(blocked, expected);
    }

    #[test]
    fn test_corrupt_vendor_blob_keeps_user_rules() {
        let rules = store_with(vec![
            (keys::LOCKDOWN_DEFAULTS, json!("garbage")),
            (keys::USER_LOCKDOWN_DOMAINS, json!({ "a.b.c": true })),
        ]);

        let blocked = rules.merged_block_domains();
        assert_eq!(blocked.len(), 1);
        assert!(blocked.contains("a.b.c"));
    }

    #[test]
    fn test_empty_store_blocks_nothing() {
        let rules = store_with(vec![]);
        assert!(rules.merged_block_domains().is_empty());
        assert!(rules.merged_allow_domains().is_empty());
        assert!(rules.merged_block_ipv4_routes().is_empty());
        assert!(rules.merged_block_ipv6_routes().is_empty());
    }

    #[test]
    fn test_allow_set_unions_vendor_and_user() {
        let rules = store_with(vec![
            (keys::CONFIRMED_WHITELISTED_DOMAINS, json!({ "apple.com": true, "icloud.com": 0 })),
            (keys::USER_WHITELISTED_DOMAINS, json!({ "bank.example.com": 1 })),
        ]);

        let allowed = rules.merged_allow_domains();
        assert!(allowed.contains("apple.com"));
        assert!(allowed.contains("*.apple.com"));
        assert!(allowed.contains("bank.example.com"));
        assert!(!allowed.contains("icloud.com"));
        assert_eq!(allowed.len(), 3);
    }

    #[test]
    fn test_routes_from_enabled_groups() {
        let rules = store_with(vec![(
            keys::LOCKDOWN_DEFAULTS,
            json!({ "lockdownDefaults": {
                "g": { "enabled": true, "ipRanges": {
                    "192.0.2.0": { "subnetMask": "255.255.255.0", "IPv6": false },
                    "2001:db8::": { "subnetMask": "48", "IPv6": true }
                }},
                "h": { "enabled": false, "ipRanges": {
                    "198.51.100.0": { "subnetMask": "255.255.255.0", "IPv6": false }
                }}
            }}),
        )]);

        assert_eq!(rules.merged_block_ipv4_routes().len(), 1);
        let v6 = rules.merged_block_ipv6_routes();
        assert_eq!(v6.len(), 1);
        assert_eq!(v6[0].prefix_length, 48);
    }
}
