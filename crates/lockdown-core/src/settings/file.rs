//! JSON file settings backend
//!
//! The whole store is one JSON object. It is cached in memory and written
//! through on every change via a temp file and rename, so a crash never
//! leaves a half-written file behind.

use super::SettingsStore;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// Settings store persisted to a JSON file
#[derive(Debug)]
pub struct FileStore {
    /// Backing file
    path: PathBuf,
    /// Cached contents
    values: RwLock<Map<String, Value>>,
    /// Modification time of the file when last read or written
    last_modified: RwLock<Option<SystemTime>>,
}

impl FileStore {
    /// Open a store, starting empty if the file does not exist yet
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            read_map(&path)?
        } else {
            debug!(path = %path.display(), "Settings file not found, starting empty");
            Map::new()
        };

        Ok(Self {
            last_modified: RwLock::new(modified_time(&path)),
            path,
            values: RwLock::new(values),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All keys currently stored, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Re-read the file if another process changed it
    ///
    /// A file that fails to parse leaves the cache as it was and is not
    /// retried until it changes again.
    pub fn check_reload(&self) -> Result<bool> {
        let Some(modified) = modified_time(&self.path) else {
            return Ok(false);
        };

        {
            let mut last_modified = self.last_modified.write();
            if last_modified.is_some_and(|last| modified <= last) {
                return Ok(false);
            }
            *last_modified = Some(modified);
        }

        info!("Settings file changed, reloading: {}", self.path.display());
        let fresh = read_map(&self.path)?;
        *self.values.write() = fresh;
        Ok(true)
    }

    /// Apply `change` to a copy, persist it, and only then make it visible
    ///
    /// `change` returns whether anything changed; unchanged maps are not
    /// written.
    fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Map<String, Value>) -> bool,
    {
        let mut values = self.values.write();
        let mut next = values.clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<()> {
        let write_err = |source| Error::SettingsWrite {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let content = serde_json::to_vec_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;

        *self.last_modified.write() = modified_time(&self.path);
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value);
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| values.remove(key).is_some())
    }

    fn set_many(&self, entries: Vec<(&str, Value)>) -> Result<()> {
        self.update(|values| {
            for (key, value) in entries {
                values.insert(key.to_string(), value);
            }
            true
        })
    }
}

fn read_map(path: &Path) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(&content).map_err(|e| Error::SettingsDecode {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("settings.json")).unwrap();
        assert!(store.keys().is_empty());
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("LockdownMetricsEnabled", json!(true)).unwrap();
            store
                .set_many(vec![("LockdownTotalMetrics", json!(7)), ("LockdownDayLogs", json!(["x"]))])
                .unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert!(store.bool("LockdownMetricsEnabled"));
        assert_eq!(store.integer("LockdownTotalMetrics"), 7);
        assert_eq!(store.string_list("LockdownDayLogs"), Some(vec!["x".to_string()]));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileStore::open(&path).unwrap();
        store.set("a", json!(1)).unwrap();
        store.remove("a").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("a"), None);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("settings.json");

        let store = FileStore::open(&path).unwrap();
        store.set("a", json!(1)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, Error::SettingsDecode { .. }));
    }

    #[test]
    fn test_non_object_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(FileStore::open(&path).is_err());
    }

    #[test]
    fn test_failed_write_leaves_cache_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "plain file").unwrap();

        let store = FileStore::open(blocker.join("settings.json")).unwrap();

        let err = store.set("LockdownMetricsEnabled", json!(true)).unwrap_err();
        assert!(matches!(err, Error::SettingsWrite { .. }));
        assert_eq!(store.get("LockdownMetricsEnabled"), None);

        assert!(store
            .set_many(vec![("a", json!(1)), ("b", json!(2))])
            .is_err());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_failed_remove_keeps_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileStore::open(&path).unwrap();
        store.set("a", json!(1)).unwrap();

        // Replace the file's directory entry with a directory so the rename fails
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.remove("a").is_err());
        assert_eq!(store.get("a"), Some(json!(1)));
    }

    #[test]
    fn test_check_reload_picks_up_external_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileStore::open(&path).unwrap();
        store.set("a", json!(1)).unwrap();
        assert!(!store.check_reload().unwrap());

        // Make sure the mtime moves forward on coarse-grained filesystems
        std::thread::sleep(std::time::Duration::from_millis(1100));
        std::fs::write(&path, r#"{ "a": 2 }"#).unwrap();

        assert!(store.check_reload().unwrap());
        assert_eq!(store.integer("a"), 2);
    }

    #[test]
    fn test_check_reload_reports_corrupt_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileStore::open(&path).unwrap();
        store.set("a", json!(1)).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(1100));
        std::fs::write(&path, "{ truncated").unwrap();

        assert!(store.check_reload().is_err());
        assert!(!store.check_reload().unwrap());
        assert_eq!(store.integer("a"), 1);
    }
}
