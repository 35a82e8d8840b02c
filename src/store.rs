//! JSON file backed key/value storage.
//!
//! The whole map is loaded when the store is opened and written back after
//! every mutation, so the file always reflects the last successful write.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{DeskError, DeskResult};

/// Durable key/value store persisted as a single JSON object
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    entries: RwLock<Map<String, Value>>,
}

impl JsonStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub async fn open(path: impl Into<PathBuf>) -> DeskResult<Self> {
        let path = path.into();
        let entries = load_entries(&path).await?;
        debug!(path = %path.display(), keys = entries.len(), "Opened JSON store");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a raw value
    pub async fn get_value(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    /// Read and deserialize a value. A value of the wrong shape is treated as
    /// missing.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key).await?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(key = key, error = %e, "Ignoring malformed stored value");
                None
            }
        }
    }

    pub async fn has(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Set several keys and persist once
    pub async fn set_many<I>(&self, values: I) -> DeskResult<()>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut entries = self.entries.write().await;
        for (key, value) in values {
            entries.insert(key, value);
        }
        self.save(&entries).await
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> DeskResult<()> {
        let value = serde_json::to_value(value)?;
        self.set_many([(key.to_string(), value)]).await
    }

    /// Delete keys and persist. Missing keys are ignored.
    pub async fn delete_many(&self, keys: &[&str]) -> DeskResult<()> {
        let mut entries = self.entries.write().await;
        let mut removed = false;
        for key in keys {
            removed |= entries.remove(*key).is_some();
        }
        if !removed && !self.path.exists() {
            return Ok(());
        }
        self.save(&entries).await
    }

    async fn save(&self, entries: &Map<String, Value>) -> DeskResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(DeskError::storage)?;
            }
        }

        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, contents)
            .await
            .map_err(DeskError::storage)?;
        debug!(path = %self.path.display(), "Saved JSON store");
        Ok(())
    }
}

async fn load_entries(path: &Path) -> DeskResult<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }

    let contents = fs::read_to_string(path).await.map_err(DeskError::storage)?;
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(entries)) => Ok(entries),
        Ok(_) | Err(_) => {
            // Unreadable state is dropped rather than blocking startup
            warn!(path = %path.display(), "Store file is not a JSON object, starting empty");
            Ok(Map::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_values_survive_reopen() -> DeskResult<()> {
        let dir = tempfile::tempdir().map_err(DeskError::storage)?;
        let path = dir.path().join("nested").join("store.json");

        let store = JsonStore::open(&path).await?;
        store.set("greeting", &"hello").await?;
        store.set("numbers", &vec![1, 2, 3]).await?;

        let reopened = JsonStore::open(&path).await?;
        assert_eq!(reopened.get::<String>("greeting").await.as_deref(), Some("hello"));
        assert_eq!(reopened.get::<Vec<u32>>("numbers").await, Some(vec![1, 2, 3]));

        reopened.delete_many(&["greeting"]).await?;
        let again = JsonStore::open(&path).await?;
        assert!(!again.has("greeting").await);
        assert!(again.has("numbers").await);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() -> DeskResult<()> {
        let dir = tempfile::tempdir().map_err(DeskError::storage)?;
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[1, 2").map_err(DeskError::storage)?;

        let store = JsonStore::open(&path).await?;
        assert!(store.get_value("anything").await.is_none());

        store.set("key", &json!({"a": 1})).await?;
        assert_eq!(store.get_value("key").await, Some(json!({"a": 1})));
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_shape_reads_as_missing() -> DeskResult<()> {
        let dir = tempfile::tempdir().map_err(DeskError::storage)?;
        let store = JsonStore::open(dir.path().join("store.json")).await?;
        store.set("count", &"not a number").await?;
        assert_eq!(store.get::<u32>("count").await, None);
        Ok(())
    }
}
