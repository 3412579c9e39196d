//! Key-value preference persistence.
//!
//! Components receive an `Arc<dyn PreferenceStore>` at construction and wrap
//! each key in a [`Persisted`] value: loaded once with a typed default,
//! written back on every change. Storage failures never reach callers; they
//! are logged and masked behind the default.

mod file;
mod memory;

use std::sync::Arc;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Keys used by the application.
pub mod keys {
    pub const SOUND_ENABLED: &str = "soundEnabled";
    pub const BROKERAGES: &str = "brokerages";
    pub const DEFAULT_BROKERAGE: &str = "defaultBrokerage";
    pub const COPY_QUANTITY_TYPE: &str = "copyQuantityType";
    pub const CUSTOM_QUANTITY: &str = "customQuantity";
    pub const QUANTITY_PERCENTAGE: &str = "quantityPercentage";
}

/// Synchronous JSON value store addressed by string keys.
pub trait PreferenceStore: Send + Sync {
    /// Raw value for `key`, `None` if never written.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the value for `key`.
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// A typed value mirrored into a [`PreferenceStore`] key.
pub struct Persisted<T> {
    store: Arc<dyn PreferenceStore>,
    key: &'static str,
    value: T,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Load `key`, seeding the store with `default` when the key is missing or unreadable.
    pub fn load(store: Arc<dyn PreferenceStore>, key: &'static str, default: T) -> Self {
        let loaded = fetch(store.as_ref(), key);

        let seeded = loaded.is_none();
        let persisted = Self {
            store,
            key,
            value: loaded.unwrap_or(default),
        };
        if seeded {
            persisted.write_back();
        }
        persisted
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value and persist it.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.write_back();
    }

    /// Mutate the value in place and persist it.
    pub fn update<F>(&mut self, f: F)
    where
        F: FnOnce(&mut T),
    {
        f(&mut self.value);
        self.write_back();
    }

    fn write_back(&self) {
        let raw = match serde_json::to_value(&self.value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = self.key, error = %e, "Failed to serialize preference");
                return;
            }
        };
        if let Err(e) = self.store.set(self.key, raw) {
            warn!(key = self.key, error = %e, "Failed to write preference");
        }
    }
}

/// Read `key` without touching the store. Missing or unreadable values yield `default`.
pub fn read_or<T: DeserializeOwned>(store: &dyn PreferenceStore, key: &str, default: T) -> T {
    fetch(store, key).unwrap_or(default)
}

fn fetch<T: DeserializeOwned>(store: &dyn PreferenceStore, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(Some(raw)) => match serde_json::from_value::<T>(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = key, error = %e, "Malformed stored preference, using default");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key = key, error = %e, "Failed to read preference, using default");
            None
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Persisted<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persisted")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::BrokenStore;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_key_seeds_default() {
        let store = Arc::new(MemoryStore::new());
        let pref = Persisted::load(store.clone(), keys::CUSTOM_QUANTITY, 100u32);

        assert_eq!(*pref.get(), 100);
        assert_eq!(store.get(keys::CUSTOM_QUANTITY).unwrap(), Some(json!(100)));
    }

    #[test]
    fn test_existing_value_wins() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::SOUND_ENABLED, json!(false)).unwrap();

        let pref = Persisted::load(store, keys::SOUND_ENABLED, true);
        assert!(!*pref.get());
    }

    #[test]
    fn test_malformed_value_falls_back() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::QUANTITY_PERCENTAGE, json!("not a number")).unwrap();

        let pref = Persisted::load(store.clone(), keys::QUANTITY_PERCENTAGE, 100u32);
        assert_eq!(*pref.get(), 100);
        assert_eq!(store.get(keys::QUANTITY_PERCENTAGE).unwrap(), Some(json!(100)));
    }

    #[test]
    fn test_set_and_update_write_back() {
        let store = Arc::new(MemoryStore::new());
        let mut pref = Persisted::load(store.clone(), keys::DEFAULT_BROKERAGE, String::new());

        pref.set("robinhood".to_string());
        assert_eq!(store.get(keys::DEFAULT_BROKERAGE).unwrap(), Some(json!("robinhood")));

        pref.update(|v| v.push_str("-2"));
        assert_eq!(pref.get(), "robinhood-2");
        assert_eq!(store.get(keys::DEFAULT_BROKERAGE).unwrap(), Some(json!("robinhood-2")));
    }

    #[test]
    fn test_broken_store_degrades_silently() {
        let mut pref = Persisted::load(Arc::new(BrokenStore), keys::SOUND_ENABLED, true);
        assert!(*pref.get());

        pref.set(false);
        assert!(!*pref.get());
    }

    #[test]
    fn test_read_or_does_not_seed() {
        let store = MemoryStore::new();
        assert_eq!(read_or(&store, keys::CUSTOM_QUANTITY, 100u32), 100);
        assert_eq!(store.get(keys::CUSTOM_QUANTITY).unwrap(), None);

        store.set(keys::CUSTOM_QUANTITY, json!(25)).unwrap();
        assert_eq!(read_or(&store, keys::CUSTOM_QUANTITY, 100u32), 25);

        store.set(keys::SOUND_ENABLED, json!("loud")).unwrap();
        assert!(read_or(&store, keys::SOUND_ENABLED, true));
        assert_eq!(store.get(keys::SOUND_ENABLED).unwrap(), Some(json!("loud")));
    }
}
