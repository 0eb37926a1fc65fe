//! Key-value persistence capability.
//!
//! Settings and histories are stored as JSON strings under stable keys. The trait is the
//! only thing the core knows about persistence; the SQLite implementation lives in
//! `peditor-store`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Stable storage keys
pub mod keys {
    pub const API_KEY: &str = "apiKey";
    pub const MODEL: &str = "model";
    pub const TEMPERATURE: &str = "temperature";
    pub const INPUT_TEXTS: &str = "inputTexts";
    pub const CURRENT_INPUT_INDEX: &str = "currentInputIndex";
    pub const OUTPUT_TEXTS: &str = "outputTexts";
    pub const CURRENT_OUTPUT_INDEX: &str = "currentOutputIndex";

    /// Key holding the selected option of a group template
    pub fn selected_option(template_title: &str) -> String {
        format!("selected-{}", template_title)
    }
}

/// Synchronous string key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Read a JSON-encoded value. Undecodable values are reported as parse errors.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>
    where
        Self: Sized,
    {
        get_json(self, key)
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        set_json(self, key, value)
    }
}

/// Shared handle used across the core
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Read a JSON-encoded value through a trait object.
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::Parse(format!("value for '{}' is not valid: {}", key, e))),
        None => Ok(None),
    }
}

/// Write a JSON-encoded value through a trait object.
pub fn set_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// In-process store for tests and `--ephemeral` sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.values.read().map(|values| values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_get_set_remove() {
        let store = MemoryKeyValueStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get(keys::MODEL).unwrap(), None);

        store.set(keys::MODEL, "gpt-4o").unwrap();
        assert_eq!(store.get(keys::MODEL).unwrap(), Some("gpt-4o".to_string()));
        assert_eq!(store.len(), 1);

        store.set(keys::MODEL, "o1").unwrap();
        assert_eq!(store.get(keys::MODEL).unwrap(), Some("o1".to_string()));

        store.remove(keys::MODEL).unwrap();
        assert_eq!(store.get(keys::MODEL).unwrap(), None);
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryKeyValueStore::new();
        store.set_json(keys::INPUT_TEXTS, &vec!["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(store.get(keys::INPUT_TEXTS).unwrap(), Some(r#"["a","b"]"#.to_string()));

        let texts: Option<Vec<String>> = store.get_json(keys::INPUT_TEXTS).unwrap();
        assert_eq!(texts, Some(vec!["a".to_string(), "b".to_string()]));

        let missing: Option<i64> = store.get_json(keys::CURRENT_INPUT_INDEX).unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_json_helpers_through_trait_object() {
        let store: SharedStore = MemoryKeyValueStore::shared();
        set_json(store.as_ref(), keys::CURRENT_OUTPUT_INDEX, &-1i64).unwrap();
        let index: Option<i64> = get_json(store.as_ref(), keys::CURRENT_OUTPUT_INDEX).unwrap();
        assert_eq!(index, Some(-1));
    }

    #[test]
    fn test_get_json_reports_corrupt_values() {
        let store = MemoryKeyValueStore::new();
        store.set(keys::OUTPUT_TEXTS, "not json").unwrap();
        let result: Result<Option<Vec<String>>> = store.get_json(keys::OUTPUT_TEXTS);
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_selected_option_key() {
        assert_eq!(keys::selected_option("Translate"), "selected-Translate");
    }
}
