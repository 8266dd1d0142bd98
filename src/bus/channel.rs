//! Per-discriminator subscriber list and history, shared by the buses.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::callback::{invoke, Callback, DispatchReport, Filter};
use super::history::BoundedHistory;

pub(crate) type CompletedFn = Box<dyn FnOnce() + Send>;

pub(crate) struct SubscriberEntry<T> {
    id: u64,
    callback: Callback<T>,
    filter: Option<Filter<T>>,
    on_completed: Mutex<Option<CompletedFn>>,
}

impl<T> SubscriberEntry<T> {
    /// Run the completion callback, if any. At most once.
    pub(crate) fn complete(&self) {
        let on_completed = self.on_completed.lock().take();
        if let Some(on_completed) = on_completed {
            on_completed();
        }
    }
}

pub(crate) enum Registration {
    Added(u64),
    /// The callback was already registered under this id.
    Existing(u64),
    /// The channel is completed; the completion callback is handed back so
    /// the caller can run it outside the lock.
    Closed(Option<CompletedFn>),
}

pub(crate) struct Channel<T> {
    subscribers: Vec<Arc<SubscriberEntry<T>>>,
    history: Option<BoundedHistory<Arc<T>>>,
    closed: bool,
}

impl<T> Channel<T> {
    pub(crate) fn new(history_capacity: Option<usize>) -> Self {
        Self {
            subscribers: Vec::new(),
            history: history_capacity.map(BoundedHistory::with_capacity),
            closed: false,
        }
    }

    pub(crate) fn register(
        &mut self,
        id: u64,
        callback: Callback<T>,
        filter: Option<Filter<T>>,
        on_completed: Option<CompletedFn>,
    ) -> Registration {
        if self.closed {
            return Registration::Closed(on_completed);
        }
        if let Some(existing) = self
            .subscribers
            .iter()
            .find(|entry| entry.callback.same_as(&callback))
        {
            return Registration::Existing(existing.id);
        }
        self.subscribers.push(Arc::new(SubscriberEntry {
            id,
            callback,
            filter,
            on_completed: Mutex::new(on_completed),
        }));
        Registration::Added(id)
    }

    /// Remove by subscription id. The removed entry's completion does not run.
    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|entry| entry.id != id);
        self.subscribers.len() != before
    }

    pub(crate) fn remove_callback(&mut self, callback: &Callback<T>) -> bool {
        let before = self.subscribers.len();
        self.subscribers
            .retain(|entry| !entry.callback.same_as(callback));
        self.subscribers.len() != before
    }

    pub(crate) fn record(&mut self, event: &Arc<T>) {
        if let Some(history) = self.history.as_mut() {
            history.push(Arc::clone(event));
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<SubscriberEntry<T>>> {
        self.subscribers.clone()
    }

    pub(crate) fn history(&self) -> Vec<Arc<T>> {
        self.history
            .as_ref()
            .map(BoundedHistory::to_vec)
            .unwrap_or_default()
    }

    pub(crate) fn clear_history(&mut self) {
        if let Some(history) = self.history.as_mut() {
            history.clear();
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Close the channel and hand back every subscriber so their completions
    /// can run outside the lock. A second call returns nothing.
    pub(crate) fn close(&mut self) -> Vec<Arc<SubscriberEntry<T>>> {
        self.closed = true;
        std::mem::take(&mut self.subscribers)
    }
}

/// Close `channel` and run each subscriber's completion once.
pub(crate) fn complete<T>(channel: &Mutex<Channel<T>>) -> usize {
    let entries = channel.lock().close();
    for entry in &entries {
        entry.complete();
    }
    entries.len()
}

/// Deliver `event` to a snapshot of subscribers, in registration order.
pub(crate) fn dispatch<T>(
    kind: &str,
    subscribers: &[Arc<SubscriberEntry<T>>],
    event: &T,
) -> DispatchReport {
    let mut report = DispatchReport::default();
    for entry in subscribers {
        let outcome = invoke(&entry.callback, entry.filter.as_ref(), event);
        report.record(outcome, kind, entry.id);
    }
    trace!(
        event = kind,
        delivered = report.delivered,
        filtered = report.filtered,
        faults = report.faults,
        "dispatched"
    );
    report
}
