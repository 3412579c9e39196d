//! Brokerage registry: connection toggles and the default venue.

use std::sync::Arc;

use tracing::{debug, info};

use crate::models::{default_brokerages, Brokerage};
use crate::store::{keys, Persisted, PreferenceStore};

/// Label used when a brokerage id does not resolve.
pub const UNKNOWN_BROKERAGE: &str = "Unknown";

/// The user's brokerages, persisted across sessions.
#[derive(Debug)]
pub struct BrokerageRegistry {
    brokerages: Persisted<Vec<Brokerage>>,
    default_brokerage: Persisted<String>,
}

impl BrokerageRegistry {
    /// Load the registry, seeding the stock brokerage list on first run.
    pub fn load(store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            brokerages: Persisted::load(store.clone(), keys::BROKERAGES, default_brokerages()),
            default_brokerage: Persisted::load(store, keys::DEFAULT_BROKERAGE, String::new()),
        }
    }

    pub fn list(&self) -> &[Brokerage] {
        self.brokerages.get()
    }

    pub fn find(&self, id: &str) -> Option<&Brokerage> {
        self.list().iter().find(|b| b.id == id)
    }

    /// Flip a brokerage's connection. Returns the new state, or `None` for an unknown id.
    pub fn toggle_connection(&mut self, id: &str) -> Option<bool> {
        self.find(id)?;

        let mut connected = false;
        self.brokerages.update(|list| {
            if let Some(b) = list.iter_mut().find(|b| b.id == id) {
                b.connected = !b.connected;
                connected = b.connected;
            }
        });

        info!(brokerage = %id, connected = connected, "Brokerage connection toggled");
        Some(connected)
    }

    /// The stored default id, possibly empty or stale.
    pub fn default_brokerage(&self) -> &str {
        self.default_brokerage.get()
    }

    /// Set the default id. Not checked against the list or connection state.
    pub fn set_default_brokerage(&mut self, id: &str) {
        debug!(brokerage = %id, "Default brokerage set");
        self.default_brokerage.set(id.to_string());
    }

    /// The default id if it names a connected brokerage, otherwise empty.
    pub fn usable_default(&self) -> &str {
        let id = self.default_brokerage();
        match self.find(id) {
            Some(b) if b.connected => id,
            _ => "",
        }
    }

    pub fn is_connected(&self, id: &str) -> bool {
        self.find(id).is_some_and(|b| b.connected)
    }

    pub fn connected(&self) -> impl Iterator<Item = &Brokerage> {
        self.list().iter().filter(|b| b.connected)
    }

    pub fn connected_count(&self) -> usize {
        self.connected().count()
    }

    /// Display name for an id, falling back to [`UNKNOWN_BROKERAGE`].
    pub fn display_name(&self, id: &str) -> &str {
        self.find(id).map(|b| b.name.as_str()).unwrap_or(UNKNOWN_BROKERAGE)
    }
}
