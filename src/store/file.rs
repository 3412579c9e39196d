//! Preference store backed by a single JSON file.
//!
//! The file is read once at open and rewritten in full on every change.
//! Concurrent processes sharing a file overwrite each other (last writer wins).

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::PreferenceStore;

/// JSON object on disk mapping preference keys to values.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Map<String, Value>>(&contents) {
                Ok(map) => {
                    debug!(path = %path.display(), keys = map.len(), "Loaded preferences");
                    map
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Preference file is malformed, starting fresh");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read preference file");
                Map::new()
            }
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn flush(&self, values: &Map<String, Value>) -> Result<()> {
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow!("preference store lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow!("preference store lock poisoned"))?;
        values.insert(key.to_string(), value);
        self.flush(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tickertribe-{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_values_survive_reopen() {
        let path = temp_path("reopen");

        let store = JsonFileStore::open(&path);
        store.set("customQuantity", json!(25)).unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("customQuantity").unwrap(), Some(json!(25)));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert_eq!(store.get("soundEnabled").unwrap(), None);

        let _ = std::fs::remove_file(&path);
    }
}
