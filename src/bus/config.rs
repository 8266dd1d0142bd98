use serde::{Deserialize, Serialize};

/// History entries kept per discriminator unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Settings shared by the immediate buses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Entries of history kept per discriminator; `None` disables history.
    pub history_capacity: Option<usize>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            history_capacity: Some(DEFAULT_HISTORY_CAPACITY),
        }
    }
}

impl BusConfig {
    pub fn with_history(mut self, capacity: usize) -> Self {
        self.history_capacity = Some(capacity);
        self
    }

    pub fn without_history(mut self) -> Self {
        self.history_capacity = None;
        self
    }
}

/// Settings for [`QueuedEventBus`](super::QueuedEventBus).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Settings of the underlying dispatching bus.
    pub bus: BusConfig,
    /// Cap on events dispatched per drain cycle; `None` drains everything
    /// that was pending when the cycle started.
    pub batch_size: Option<usize>,
}

impl QueueConfig {
    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }
}
