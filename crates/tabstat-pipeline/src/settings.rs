//! Persisted key-value selection state

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key of the selected test label
pub const SELECTED_TEST: &str = "selected_test";
/// Key of the selected graph type label
pub const GRAPH_TYPE: &str = "graph_type";
/// Key of the graph customization object
pub const GRAPH_CUSTOMIZATION: &str = "graph_customization";

/// A flat JSON object on disk, rewritten in full on every change
///
/// Reads never fail: a missing or unreadable file loads as an empty map.
/// Writes go straight through and report any failure.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl SettingsStore {
    /// Open the store at `path`, loading whatever it currently holds
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = load(&path);
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw stored value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Stored value, or `default` when the key is absent
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.values.get(key).cloned().unwrap_or(default)
    }

    /// Stored value decoded as `T`; absent, null and mistyped values are `None`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!("Ignoring setting '{key}': {e}");
                None
            }
        }
    }

    /// Store a value and rewrite the file
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.values.insert(key.to_string(), value);
        self.save()
    }

    /// Reset to an empty map and rewrite the file
    pub fn clear(&mut self) -> Result<()> {
        self.values.clear();
        self.save()
    }

    /// Re-read the file, replacing the in-memory map
    pub fn reload(&mut self) {
        self.values = load(&self.path);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The whole map as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.values)?)
    }

    fn save(&self) -> Result<()> {
        let content = self.to_json_string()?;
        std::fs::write(&self.path, content).map_err(|source| Error::SettingsWrite {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!("Saved {} settings to {}", self.values.len(), self.path.display());
        Ok(())
    }
}

fn load(path: &Path) -> BTreeMap<String, Value> {
    if !path.exists() {
        return BTreeMap::new();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
    parsed.unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings from {}, using defaults: {e}", path.display());
        BTreeMap::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::open(dir.path().join("absent.json"));
        assert!(store.is_empty());
        assert_eq!(store.get_or("selected_test", json!("none")), json!("none"));
    }

    #[test]
    fn test_set_writes_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::open(&path);
        store.set(SELECTED_TEST, "t検定").unwrap();

        let reopened = SettingsStore::open(&path);
        assert_eq!(reopened.get(SELECTED_TEST), Some(&json!("t検定")));
        assert_eq!(reopened.get_as::<String>(SELECTED_TEST).as_deref(), Some("t検定"));
    }

    #[test]
    fn test_clear_writes_empty_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::open(&path);
        store.set(GRAPH_TYPE, "箱ひげ図").unwrap();
        store.clear().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
        assert_eq!(store.get_or(GRAPH_TYPE, json!(null)), json!(null));
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(SettingsStore::open(&path).is_empty());
    }

    #[test]
    fn test_unwritable_path_fails_on_set() {
        let dir = TempDir::new().unwrap();
        let mut store = SettingsStore::open(dir.path().join("missing-dir").join("s.json"));
        assert!(matches!(
            store.set(SELECTED_TEST, "x"),
            Err(Error::SettingsWrite { .. })
        ));
    }
}
