//! Integration tests for rule merging

use lockdown_core::rules::{Ipv4Route, RuleStore, SettingsRuleStore};
use lockdown_core::settings::{keys, MemoryStore, SettingsStore};
use serde_json::{json, Value};
use std::net::Ipv4Addr;
use std::sync::Arc;

fn rules_with(entries: Vec<(&str, Value)>) -> (SettingsRuleStore, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.set_many(entries).unwrap();
    (SettingsRuleStore::new(store.clone()), store)
}

fn vendor(groups: Value) -> (&'static str, Value) {
    (keys::LOCKDOWN_DEFAULTS, json!({ "lockdownDefaults": groups }))
}

// ============ Wildcard Expansion ============

#[test]
fn test_two_label_key_adds_wildcard() {
    let (rules, _) = rules_with(vec![(keys::USER_LOCKDOWN_DOMAINS, json!({ "example.com": true }))]);
    let blocked = rules.merged_block_domains();

    assert!(blocked.contains("example.com"));
    assert!(blocked.contains("*.example.com"));
    assert_eq!(blocked.len(), 2);
}

#[test]
fn test_deeper_key_is_literal_only() {
    let (rules, _) = rules_with(vec![(
        keys::USER_LOCKDOWN_DOMAINS,
        json!({ "sub.example.com": true }),
    )]);
    let blocked = rules.merged_block_domains();

    assert!(blocked.contains("sub.example.com"));
    assert!(!blocked.contains("*.sub.example.com"));
    assert_eq!(blocked.len(), 1);
}

#[test]
fn test_single_label_key_is_literal_only() {
    let (rules, _) = rules_with(vec![(keys::USER_WHITELISTED_DOMAINS, json!({ "localhost": true }))]);
    assert_eq!(rules.merged_allow_domains().len(), 1);
}

// ============ Group Enablement ============

#[test]
fn test_only_enabled_groups_contribute() {
    let (rules, _) = rules_with(vec![vendor(json!({
        "ads": { "enabled": true, "domains": { "ads.example.com": true } },
        "social": { "enabled": false, "domains": { "social.example.com": true } }
    }))]);
    let blocked = rules.merged_block_domains();

    assert!(blocked.contains("ads.example.com"));
    assert!(!blocked.contains("social.example.com"));
}

#[test]
fn test_disabled_group_contributes_no_routes() {
    let (rules, _) = rules_with(vec![vendor(json!({
        "on": {
            "enabled": true,
            "ipRanges": { "198.51.100.0": { "subnetMask": "255.255.255.0", "IPv6": false } }
        },
        "off": {
            "enabled": false,
            "ipRanges": { "203.0.113.0": { "subnetMask": "255.255.255.0", "IPv6": false } }
        }
    }))]);

    assert_eq!(
        rules.merged_block_ipv4_routes(),
        vec![Ipv4Route {
            destination: Ipv4Addr::new(198, 51, 100, 0),
            subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
        }]
    );
    assert!(rules.merged_block_ipv6_routes().is_empty());
}

// ============ Merging ============

#[test]
fn test_vendor_and_user_are_unioned() {
    let (rules, _) = rules_with(vec![
        vendor(json!({ "g": { "enabled": true, "domains": { "ads.example.com": true } } })),
        (keys::USER_LOCKDOWN_DOMAINS, json!({ "tracker.io": true, "off.io": false })),
        (keys::CONFIRMED_WHITELISTED_DOMAINS, json!({ "bank.com": true })),
        (keys::USER_WHITELISTED_DOMAINS, json!({ "mail.example.org": true })),
    ]);

    let blocked = rules.merged_block_domains();
    assert!(blocked.contains("ads.example.com"));
    assert!(blocked.contains("tracker.io"));
    assert!(blocked.contains("*.tracker.io"));
    assert!(!blocked.contains("off.io"));

    let allowed = rules.merged_allow_domains();
    assert!(allowed.contains("bank.com"));
    assert!(allowed.contains("*.bank.com"));
    assert!(allowed.contains("mail.example.org"));
    assert_eq!(allowed.len(), 3);
}

#[test]
fn test_non_boolean_override_counts_as_disabled() {
    let (rules, _) = rules_with(vec![(
        keys::USER_LOCKDOWN_DOMAINS,
        json!({ "a.com": "yes", "b.com": 1, "c.com": 2, "d.com": null }),
    )]);
    let blocked = rules.merged_block_domains();

    assert!(!blocked.contains("a.com"));
    assert!(blocked.contains("b.com"));
    assert!(!blocked.contains("c.com"));
    assert!(!blocked.contains("d.com"));
}

#[test]
fn test_undecodable_vendor_blob_is_empty() {
    let (rules, _) = rules_with(vec![(keys::LOCKDOWN_DEFAULTS, json!("not a rule set"))]);

    assert!(rules.merged_block_domains().is_empty());
    assert!(rules.merged_block_ipv4_routes().is_empty());
}

#[test]
fn test_settings_changes_visible_immediately() {
    let (rules, store) = rules_with(vec![]);
    assert!(rules.merged_block_domains().is_empty());

    store
        .set(keys::USER_LOCKDOWN_DOMAINS, json!({ "late.example.com": true }))
        .unwrap();
    assert!(rules.merged_block_domains().contains("late.example.com"));

    store.remove(keys::USER_LOCKDOWN_DOMAINS).unwrap();
    assert!(rules.merged_block_domains().is_empty());
}
