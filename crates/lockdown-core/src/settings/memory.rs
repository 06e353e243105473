//! In-memory settings backend

use super::SettingsStore;
use crate::error::Result;
use dashmap::DashMap;
use serde_json::Value;

/// Settings store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, Value>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if store is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}
