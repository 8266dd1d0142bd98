use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::value::StateValue;

/// Error converting a [`StateSnapshot`] to or from its persisted forms.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("document error: {0}")]
    Document(#[from] serde_json::Error),
    #[error("binary error: {0}")]
    Binary(#[from] bitcode::Error),
}

/// Point-in-time copy of a store's current values, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub values: BTreeMap<String, StateValue>,
}

impl StateSnapshot {
    pub fn get(&self, name: &str) -> Option<&StateValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Human-readable JSON key-value document.
    pub fn to_document(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_document(document: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Compact binary form.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bitcode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bitcode::deserialize(bytes)?)
    }
}
