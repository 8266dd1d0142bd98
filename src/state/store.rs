use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::snapshot::StateSnapshot;
use super::value::StateValue;
use crate::bus::{BoundedHistory, DEFAULT_HISTORY_CAPACITY};

/// Settings for [`StateStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateStoreConfig {
    /// Values kept per key in [`StateStore::state_history`].
    pub history_capacity: usize,
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl StateStoreConfig {
    pub fn with_history(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}

#[derive(Default)]
struct Entries {
    current: HashMap<String, StateValue>,
    history: HashMap<String, BoundedHistory<StateValue>>,
}

/// Named game-wide values with a bounded per-key history.
///
/// Removing a key forgets its current value but keeps its history.
pub struct StateStore {
    config: StateStoreConfig,
    entries: RwLock<Entries>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::with_config(StateStoreConfig::default())
    }

    pub fn with_config(config: StateStoreConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(Entries::default()),
        }
    }

    pub fn set_state(&self, name: &str, value: impl Into<StateValue>) {
        let value = value.into();
        let mut entries = self.entries.write();
        Self::record(&mut entries, &self.config, name, value);
    }

    pub fn get_state(&self, name: &str) -> Option<StateValue> {
        self.entries.read().current.get(name).cloned()
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.entries.read().current.contains_key(name)
    }

    pub fn remove_state(&self, name: &str) -> Option<StateValue> {
        self.entries.write().current.remove(name)
    }

    /// Values set under `name`, oldest first.
    pub fn state_history(&self, name: &str) -> Vec<StateValue> {
        self.entries.read()
            .history
            .get(name)
            .map(BoundedHistory::to_vec)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().current.is_empty()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let entries = self.entries.read();
        StateSnapshot {
            values: entries
                .current
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }

    /// Replace the current values with `snapshot`'s. Each restored value is
    /// appended to its key's history.
    pub fn restore(&self, snapshot: &StateSnapshot) {
        let mut entries = self.entries.write();
        entries.current.clear();
        for (name, value) in &snapshot.values {
            Self::record(&mut entries, &self.config, name, value.clone());
        }
        debug!(keys = snapshot.len(), "state restored");
    }

    fn record(entries: &mut Entries, config: &StateStoreConfig, name: &str, value: StateValue) {
        entries
            .history
            .entry(name.to_string())
            .or_insert_with(|| BoundedHistory::with_capacity(config.history_capacity))
            .push(value.clone());
        entries.current.insert(name.to_string(), value);
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("keys", &self.len())
            .finish()
    }
}
