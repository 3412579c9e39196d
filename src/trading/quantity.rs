//! Copy quantity sizing: same as the master, a fixed amount, or a percentage.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::{keys, read_or, Persisted, PreferenceStore};

pub const DEFAULT_CUSTOM_QUANTITY: u32 = 100;
pub const DEFAULT_PERCENTAGE: u32 = 100;

/// Policy used to size a copy trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityMode {
    /// Copy the master's quantity unchanged
    #[default]
    Same,
    /// Always copy a fixed quantity
    Custom,
    /// Scale the master's quantity; above 100 means leverage
    Percentage,
}

impl QuantityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Same => "same",
            Self::Custom => "custom",
            Self::Percentage => "percentage",
        }
    }
}

impl FromStr for QuantityMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "same" => Ok(Self::Same),
            "custom" | "fixed" => Ok(Self::Custom),
            "percentage" | "percent" | "pct" => Ok(Self::Percentage),
            other => anyhow::bail!("unknown quantity mode '{}' (same, custom, percentage)", other),
        }
    }
}

impl std::fmt::Display for QuantityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size a copy of a trade of `original` shares.
///
/// Percentage sizing always rounds down; fractional shares are not modeled.
pub fn derive_quantity(original: u32, mode: QuantityMode, custom: u32, percentage: u32) -> u32 {
    match mode {
        QuantityMode::Same => original,
        QuantityMode::Custom => custom,
        QuantityMode::Percentage => {
            let scaled = u64::from(original) * u64::from(percentage) / 100;
            u32::try_from(scaled).unwrap_or(u32::MAX)
        }
    }
}

/// Snapshot of the three quantity preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityPreference {
    pub mode: QuantityMode,
    pub custom_quantity: u32,
    pub percentage: u32,
}

impl QuantityPreference {
    /// Current stored preferences, without seeding missing keys.
    pub fn read(store: &dyn PreferenceStore) -> Self {
        let defaults = Self::default();
        Self {
            mode: read_or(store, keys::COPY_QUANTITY_TYPE, defaults.mode),
            custom_quantity: read_or(store, keys::CUSTOM_QUANTITY, defaults.custom_quantity),
            percentage: read_or(store, keys::QUANTITY_PERCENTAGE, defaults.percentage),
        }
    }

    pub fn quantity_for(&self, original: u32) -> u32 {
        derive_quantity(original, self.mode, self.custom_quantity, self.percentage)
    }
}

impl Default for QuantityPreference {
    fn default() -> Self {
        Self {
            mode: QuantityMode::Same,
            custom_quantity: DEFAULT_CUSTOM_QUANTITY,
            percentage: DEFAULT_PERCENTAGE,
        }
    }
}

/// Persisted quantity preferences.
#[derive(Debug)]
pub struct QuantitySettings {
    mode: Persisted<QuantityMode>,
    custom_quantity: Persisted<u32>,
    percentage: Persisted<u32>,
}

impl QuantitySettings {
    pub fn load(store: Arc<dyn PreferenceStore>) -> Self {
        let defaults = QuantityPreference::default();
        Self {
            mode: Persisted::load(store.clone(), keys::COPY_QUANTITY_TYPE, defaults.mode),
            custom_quantity: Persisted::load(
                store.clone(),
                keys::CUSTOM_QUANTITY,
                defaults.custom_quantity,
            ),
            percentage: Persisted::load(store, keys::QUANTITY_PERCENTAGE, defaults.percentage),
        }
    }

    pub fn preference(&self) -> QuantityPreference {
        QuantityPreference {
            mode: *self.mode.get(),
            custom_quantity: *self.custom_quantity.get(),
            percentage: *self.percentage.get(),
        }
    }

    pub fn mode(&self) -> QuantityMode {
        *self.mode.get()
    }

    pub fn set_mode(&mut self, mode: QuantityMode) {
        self.mode.set(mode);
    }

    /// Set the fixed copy quantity (at least 1).
    pub fn set_custom_quantity(&mut self, quantity: u32) {
        self.custom_quantity.set(quantity.max(1));
    }

    /// Set the percentage multiplier (at least 1, no upper bound).
    pub fn set_percentage(&mut self, percentage: u32) {
        self.percentage.set(percentage.max(1));
    }

    /// Copy size for a trade of `original` shares under the current preferences.
    pub fn calculate(&self, original: u32) -> u32 {
        self.preference().quantity_for(original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_derive_quantity_modes() {
        assert_eq!(derive_quantity(100, QuantityMode::Same, 25, 50), 100);
        assert_eq!(derive_quantity(100, QuantityMode::Custom, 25, 50), 25);
        assert_eq!(derive_quantity(7, QuantityMode::Custom, 25, 50), 25);
        assert_eq!(derive_quantity(100, QuantityMode::Percentage, 25, 50), 50);
    }

    #[test]
    fn test_percentage_always_floors() {
        assert_eq!(derive_quantity(3, QuantityMode::Percentage, 1, 50), 1);
        assert_eq!(derive_quantity(199, QuantityMode::Percentage, 1, 50), 99);
        assert_eq!(derive_quantity(1, QuantityMode::Percentage, 1, 99), 0);
        assert_eq!(derive_quantity(75, QuantityMode::Percentage, 1, 33), 24);
    }

    #[test]
    fn test_percentage_above_hundred_is_leverage() {
        assert_eq!(derive_quantity(80, QuantityMode::Percentage, 1, 250), 200);
        assert_eq!(derive_quantity(33, QuantityMode::Percentage, 1, 150), 49);
    }

    #[test]
    fn test_percentage_matches_floor_formula() {
        for q in [1u32, 7, 10, 99, 100, 209, 1_000] {
            for p in [1u32, 33, 50, 99, 100, 101, 175, 500] {
                let expected = (q as f64 * p as f64 / 100.0).floor() as u32;
                assert_eq!(derive_quantity(q, QuantityMode::Percentage, 1, p), expected);
            }
        }
    }

    #[test]
    fn test_settings_clamp_and_persist() {
        let store = Arc::new(MemoryStore::new());
        let mut settings = QuantitySettings::load(store.clone());
        assert_eq!(settings.preference(), QuantityPreference::default());

        settings.set_mode(QuantityMode::Percentage);
        settings.set_percentage(0);
        settings.set_custom_quantity(0);

        let reloaded = QuantitySettings::load(store);
        let pref = reloaded.preference();
        assert_eq!(pref.mode, QuantityMode::Percentage);
        assert_eq!(pref.percentage, 1);
        assert_eq!(pref.custom_quantity, 1);
    }

    #[test]
    fn test_read_leaves_store_untouched() {
        let store = MemoryStore::new();
        assert_eq!(QuantityPreference::read(&store), QuantityPreference::default());
        assert_eq!(store.get(keys::COPY_QUANTITY_TYPE).unwrap(), None);

        store.set(keys::COPY_QUANTITY_TYPE, serde_json::json!("custom")).unwrap();
        store.set(keys::CUSTOM_QUANTITY, serde_json::json!(25)).unwrap();

        let pref = QuantityPreference::read(&store);
        assert_eq!(pref.mode, QuantityMode::Custom);
        assert_eq!(pref.custom_quantity, 25);
        assert_eq!(store.get(keys::QUANTITY_PERCENTAGE).unwrap(), None);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Percentage".parse::<QuantityMode>().unwrap(), QuantityMode::Percentage);
        assert_eq!("custom".parse::<QuantityMode>().unwrap(), QuantityMode::Custom);
        assert!("double".parse::<QuantityMode>().is_err());
    }
}
