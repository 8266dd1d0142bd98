use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use super::callback::{Callback, Filter};
use super::config::QueueConfig;
use super::event::NamedEvent;
use super::named_bus::EventBus;
use crate::disposable::Subscription;

/// Result of one drain cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainResult {
    /// Events taken off the queue and dispatched.
    pub dispatched: usize,
    /// Handler invocations that completed.
    pub delivered: usize,
    /// Deliveries skipped by subscriber filters.
    pub filtered: usize,
    /// Subscriber faults contained during the cycle.
    pub faults: usize,
    /// Events still queued when the cycle ended.
    pub remaining: usize,
}

/// Lifecycle of a [`QueuedEventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Pending,
    Dispatching,
    Disposed,
}

struct QueuedEntry {
    priority: i32,
    sequence: u64,
    event: NamedEvent,
}

// Max-heap order: higher priority first, then earlier emission.
impl Ord for QueuedEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueuedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for QueuedEntry {}

struct QueuedInner {
    core: EventBus,
    config: QueueConfig,
    pending: Mutex<BinaryHeap<QueuedEntry>>,
    sequence: AtomicU64,
    dispatching: AtomicBool,
}

/// Name-indexed bus that defers delivery to an explicit [`drain`](Self::drain).
///
/// `emit_event` only enqueues. Each drain dispatches the events that were
/// pending when it started, highest priority first and in emission order
/// among equal priorities. Events emitted by handlers during a drain wait
/// for the next one.
///
/// ```text
/// emit_event ──► pending heap ──drain()──► EventBus ──► subscribers
///                                            │
///                                            └──► history
/// ```
#[derive(Clone)]
pub struct QueuedEventBus {
    inner: Arc<QueuedInner>,
}

impl QueuedEventBus {
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            inner: Arc::new(QueuedInner {
                core: EventBus::with_config(config.bus.clone()),
                config,
                pending: Mutex::new(BinaryHeap::new()),
                sequence: AtomicU64::new(0),
                dispatching: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Queue `data` under `name`. Returns whether it was queued.
    pub fn emit_event(&self, name: &str, data: Value, priority: i32) -> bool {
        self.emit(NamedEvent::new(name, data).with_priority(priority))
    }

    /// Queue `event` at its own priority. Returns whether it was queued.
    pub fn emit(&self, event: NamedEvent) -> bool {
        if self.is_disposed() {
            warn!(event = %event.name, "emit on disposed bus ignored");
            return false;
        }
        if event.is_empty_payload() {
            warn!(event = %event.name, "event without payload ignored");
            return false;
        }

        let sequence = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
        self.inner.pending.lock().push(QueuedEntry {
            priority: event.priority,
            sequence,
            event,
        });
        true
    }

    /// Run one drain cycle on the calling thread.
    ///
    /// A drain that starts while another is running (including one started
    /// from inside a handler) does nothing.
    pub fn drain(&self) -> DrainResult {
        if self.is_disposed() {
            return DrainResult::default();
        }
        if self
            .inner
            .dispatching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("drain already in progress");
            return DrainResult {
                remaining: self.pending_len(),
                ..DrainResult::default()
            };
        }

        let batch = self.take_batch();
        let mut result = DrainResult {
            dispatched: batch.len(),
            ..DrainResult::default()
        };
        for entry in batch {
            let report = self.inner.core.emit(entry.event);
            result.delivered += report.delivered;
            result.filtered += report.filtered;
            result.faults += report.faults;
        }

        self.inner.dispatching.store(false, Ordering::Release);
        result.remaining = self.pending_len();
        if result.dispatched > 0 {
            debug!(
                dispatched = result.dispatched,
                delivered = result.delivered,
                faults = result.faults,
                remaining = result.remaining,
                "drain cycle finished"
            );
        }
        result
    }

    fn take_batch(&self) -> Vec<QueuedEntry> {
        let mut pending = self.inner.pending.lock();
        let limit = self
            .inner
            .config
            .batch_size
            .map_or(pending.len(), |size| size.min(pending.len()));
        let mut batch = Vec::with_capacity(limit);
        while batch.len() < limit {
            match pending.pop() {
                Some(entry) => batch.push(entry),
                None => break,
            }
        }
        batch
    }

    pub fn state(&self) -> QueueState {
        if self.is_disposed() {
            QueueState::Disposed
        } else if self.inner.dispatching.load(Ordering::Acquire) {
            QueueState::Dispatching
        } else if self.pending_len() > 0 {
            QueueState::Pending
        } else {
            QueueState::Idle
        }
    }

    pub fn pending_len(&self) -> usize {
        self.inner.pending.lock().len()
    }

    pub fn subscribe(
        &self,
        name: &str,
        callback: Callback<NamedEvent>,
        filter: Option<Filter<NamedEvent>>,
    ) -> Subscription {
        self.inner.core.subscribe(name, callback, filter)
    }

    pub fn on<F>(&self, name: &str, handler: F) -> Subscription
    where
        F: Fn(&NamedEvent) + Send + Sync + 'static,
    {
        self.inner.core.on(name, handler)
    }

    pub fn unsubscribe(&self, name: &str, callback: &Callback<NamedEvent>) -> bool {
        self.inner.core.unsubscribe(name, callback)
    }

    /// Events dispatched under `name`, oldest first. Still-queued events are
    /// not part of the history.
    pub fn get_event_history(&self, name: &str) -> Vec<Arc<NamedEvent>> {
        self.inner.core.get_event_history(name)
    }

    pub fn clear_history(&self, name: &str) {
        self.inner.core.clear_history(name);
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.inner.core.subscriber_count(name)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.core.is_disposed()
    }

    /// Discard pending events and dispose the underlying bus.
    pub fn dispose(&self) {
        if self.is_disposed() {
            return;
        }
        let discarded = {
            let mut pending = self.inner.pending.lock();
            let discarded = pending.len();
            pending.clear();
            discarded
        };
        self.inner.core.dispose();
        debug!(discarded, "queued event bus disposed");
    }
}

impl Default for QueuedEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueuedEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedEventBus")
            .field("state", &self.state())
            .field("pending", &self.pending_len())
            .finish()
    }
}
