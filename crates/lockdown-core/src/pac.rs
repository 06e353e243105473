//! Proxy auto-configuration script
//!
//! The script only decides whether traffic goes through the local proxy at
//! all. Per-host decisions are made by the interception policy.

use crate::rules::RuleStore;

/// Script used when there are no rules: bypass the proxy entirely
pub const DIRECT_SCRIPT: &str = r#"function FindProxyForURL(url, host) { return "DIRECT" }"#;

/// Script used when any rule is active: send everything to the local proxy
pub const PROXY_SCRIPT: &str =
    r#"function FindProxyForURL(url, host) { return "PROXY 127.0.0.1"; }"#;

/// Generate the PAC script for the given rule counts
pub fn generate(allow_rule_count: usize, block_rule_count: usize) -> String {
    if allow_rule_count == 0 && block_rule_count == 0 {
        DIRECT_SCRIPT.to_string()
    } else {
        PROXY_SCRIPT.to_string()
    }
}

/// Generate the PAC script from the current merged rules
pub fn for_rules(rules: &dyn RuleStore) -> String {
    generate(
        rules.merged_allow_domains().len(),
        rules.merged_block_domains().len(),
    )
}
