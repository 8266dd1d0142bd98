//! Event payloads carried by the buses.

use std::time::SystemTime;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A strongly typed event routed by [`GameEventBus`](super::GameEventBus).
///
/// The bus routes on the Rust type; `KIND` is the stable tag used in logs
/// and diagnostics.
///
/// ```
/// use gamebus::GameEvent;
/// use std::time::SystemTime;
///
/// struct HealthChanged {
///     current: i32,
///     at: SystemTime,
/// }
///
/// impl GameEvent for HealthChanged {
///     const KIND: &'static str = "HealthChanged";
///
///     fn timestamp(&self) -> SystemTime {
///         self.at
///     }
/// }
/// ```
pub trait GameEvent: Send + Sync + 'static {
    const KIND: &'static str;

    /// When the event was created.
    fn timestamp(&self) -> SystemTime;
}

/// A string-keyed event for [`EventBus`](super::EventBus) and
/// [`QueuedEventBus`](super::QueuedEventBus).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedEvent {
    /// Event name (e.g., "HealthChanged", "LevelUp")
    pub name: String,
    /// Payload; `Value::Null` counts as no payload
    pub data: Value,
    /// Dispatch priority for queued delivery (higher first)
    pub priority: i32,
    /// Creation time
    pub timestamp: SystemTime,
}

impl NamedEvent {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            priority: 0,
            timestamp: SystemTime::now(),
        }
    }

    /// Create an event whose payload is `payload` converted to JSON.
    pub fn encode<T: Serialize>(
        name: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(name, serde_json::to_value(payload)?))
    }

    /// Decode the payload into a concrete type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_empty_payload(&self) -> bool {
        self.data.is_null()
    }
}
