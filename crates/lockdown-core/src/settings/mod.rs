//! Key/value settings shared with the host application
//!
//! Rule sets, user overrides and the metrics-enabled flag are owned by the
//! app and only read here. Block metrics are the one thing this crate writes.
//! Values are loosely typed JSON; typed accessors decode them strictly and
//! fall back to "disabled"/zero instead of failing.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Well-known settings keys
pub mod keys {
    /// Vendor rule set blob
    pub const LOCKDOWN_DEFAULTS: &str = "LockdownDefaults";
    /// User block overrides (domain -> enabled)
    pub const USER_LOCKDOWN_DOMAINS: &str = "UserLockdownDomains";
    /// Vendor allow list (domain -> enabled)
    pub const CONFIRMED_WHITELISTED_DOMAINS: &str = "ConfirmedWhitelistedDomains";
    /// User allow list (domain -> enabled)
    pub const USER_WHITELISTED_DOMAINS: &str = "UserWhitelistedDomains";
    /// Whether block metrics are recorded at all
    pub const METRICS_ENABLED: &str = "LockdownMetricsEnabled";

    /// Lifetime block count
    pub const TOTAL_METRICS: &str = "LockdownTotalMetrics";
    /// Blocks since the start of the active day
    pub const DAY_METRICS: &str = "LockdownDayMetrics";
    /// Day of month the day counter belongs to
    pub const ACTIVE_DAY: &str = "LockdownActiveDay";
    /// Blocked hosts logged during the active day
    pub const DAY_LOGS: &str = "LockdownDayLogs";
    /// Blocks since the start of the active week
    pub const WEEK_METRICS: &str = "LockdownWeekMetrics";
    /// ISO week the week counter belongs to
    pub const ACTIVE_WEEK: &str = "LockdownActiveWeek";
}

/// Persistent key/value store
///
/// Implementations must tolerate concurrent readers and writers.
pub trait SettingsStore: Send + Sync {
    /// Read a raw value
    fn get(&self, key: &str) -> Option<Value>;

    /// Write a raw value
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete a value
    fn remove(&self, key: &str) -> Result<()>;

    /// Write several values at once
    ///
    /// Backends that persist to disk override this to write a single time.
    fn set_many(&self, entries: Vec<(&str, Value)>) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Read a boolean, treating anything undecodable as `false`
    fn bool(&self, key: &str) -> bool {
        self.get(key).as_ref().and_then(decode_bool).unwrap_or(false)
    }

    /// Read an integer, treating anything undecodable as `0`
    fn integer(&self, key: &str) -> i64 {
        self.get(key).and_then(|v| v.as_i64()).unwrap_or(0)
    }

    /// Read a list of strings, skipping non-string elements
    fn string_list(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Read a domain -> enabled map
    ///
    /// Entries whose value is not a strict boolean are kept as disabled.
    fn bool_map(&self, key: &str) -> BTreeMap<String, bool> {
        match self.get(key) {
            Some(Value::Object(entries)) => entries
                .into_iter()
                .map(|(domain, value)| {
                    let enabled = decode_bool(&value).unwrap_or_else(|| {
                        debug!(key, domain = %domain, value = %value, "Non-boolean override, treating as disabled");
                        false
                    });
                    (domain, enabled)
                })
                .collect(),
            Some(other) => {
                warn!(key, kind = value_kind(&other), "Expected a map of overrides, ignoring");
                BTreeMap::new()
            }
            None => BTreeMap::new(),
        }
    }
}

/// Strictly decode a boolean setting
///
/// Accepts JSON booleans and the integers 0 and 1 (how property lists store
/// booleans). Everything else is rejected.
pub fn decode_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
