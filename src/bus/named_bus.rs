use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::callback::{Callback, DispatchReport, Filter};
use super::channel::{self, Channel, Registration};
use super::config::BusConfig;
use super::event::NamedEvent;
use crate::disposable::Subscription;

type NamedChannel = Arc<Mutex<Channel<NamedEvent>>>;

struct NamedInner {
    config: BusConfig,
    channels: RwLock<HashMap<String, NamedChannel>>,
    next_id: AtomicU64,
    disposed: AtomicBool,
}

/// Name-indexed, synchronous event bus with bounded per-name history.
///
/// Every emitted event is appended to its name's history (when enabled)
/// before it is delivered, so late subscribers can inspect what happened.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<NamedInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(NamedInner {
                config,
                channels: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Emit `data` under `name`.
    pub fn emit_event(&self, name: &str, data: Value) -> DispatchReport {
        self.emit(NamedEvent::new(name, data))
    }

    /// Emit `payload` converted to JSON.
    pub fn emit_serialized<T: Serialize>(
        &self,
        name: &str,
        payload: &T,
    ) -> Result<DispatchReport, serde_json::Error> {
        Ok(self.emit(NamedEvent::encode(name, payload)?))
    }

    /// Record `event` in its history, then deliver it.
    ///
    /// An event without payload, or any event after dispose, is logged and
    /// dropped.
    pub fn emit(&self, event: NamedEvent) -> DispatchReport {
        if self.is_disposed() {
            warn!(event = %event.name, "emit on disposed bus ignored");
            return DispatchReport::default();
        }
        if event.is_empty_payload() {
            warn!(event = %event.name, "event without payload ignored");
            return DispatchReport::default();
        }

        let channel = if self.inner.config.history_capacity.is_some() {
            self.channel_or_create(&event.name)
        } else {
            self.channel(&event.name)
        };
        let Some(channel) = channel else {
            return DispatchReport::default();
        };

        let event = Arc::new(event);
        let subscribers = {
            let mut channel = channel.lock();
            if channel.is_closed() {
                return DispatchReport::default();
            }
            channel.record(&event);
            channel.snapshot()
        };
        channel::dispatch(&event.name, &subscribers, &*event)
    }

    /// Register `callback` for `name`, optionally behind `filter`.
    ///
    /// A callback already registered for `name` is left alone and an empty
    /// subscription is returned.
    pub fn subscribe(
        &self,
        name: &str,
        callback: Callback<NamedEvent>,
        filter: Option<Filter<NamedEvent>>,
    ) -> Subscription {
        let Some(channel) = self.channel_or_create(name) else {
            debug!(event = name, "subscribe on disposed bus");
            return Subscription::empty();
        };

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let registration = channel.lock().register(id, callback, filter, None);
        match registration {
            Registration::Added(id) => {
                let channel = Arc::downgrade(&channel);
                Subscription::new(move || release(&channel, id))
            }
            Registration::Existing(existing) => {
                debug!(event = name, subscriber = existing, "callback already subscribed");
                Subscription::empty()
            }
            Registration::Closed(_) => Subscription::empty(),
        }
    }

    /// Shorthand for an unfiltered [`subscribe`](Self::subscribe).
    pub fn on<F>(&self, name: &str, handler: F) -> Subscription
    where
        F: Fn(&NamedEvent) + Send + Sync + 'static,
    {
        self.subscribe(name, Callback::new(handler), None)
    }

    pub fn unsubscribe(&self, name: &str, callback: &Callback<NamedEvent>) -> bool {
        match self.channel(name) {
            Some(channel) => channel.lock().remove_callback(callback),
            None => false,
        }
    }

    /// Recent events emitted under `name`, oldest first.
    pub fn get_event_history(&self, name: &str) -> Vec<Arc<NamedEvent>> {
        self.channel(name)
            .map(|channel| channel.lock().history())
            .unwrap_or_default()
    }

    pub fn clear_history(&self, name: &str) {
        if let Some(channel) = self.channel(name) {
            channel.lock().clear_history();
        }
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.channel(name)
            .map(|channel| channel.lock().len())
            .unwrap_or(0)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Drop every subscriber and all history. Idempotent.
    pub fn dispose(&self) {
        let channels: Vec<_> = {
            let mut channels = self.inner.channels.write();
            if self.inner.disposed.swap(true, Ordering::SeqCst) {
                return;
            }
            channels.drain().collect()
        };

        for (name, channel) in channels {
            let count = channel::complete(&channel);
            debug!(event = %name, subscribers = count, "channel completed");
        }
        debug!("event bus disposed");
    }

    fn channel(&self, name: &str) -> Option<NamedChannel> {
        self.inner.channels.read().get(name).cloned()
    }

    fn channel_or_create(&self, name: &str) -> Option<NamedChannel> {
        if let Some(channel) = self.channel(name) {
            return Some(channel);
        }
        let mut channels = self.inner.channels.write();
        if self.is_disposed() {
            return None;
        }
        let history = self.inner.config.history_capacity;
        let channel = channels
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Channel::new(history))));
        Some(Arc::clone(channel))
    }
}

fn release(channel: &Weak<Mutex<Channel<NamedEvent>>>, id: u64) {
    if let Some(channel) = channel.upgrade() {
        channel.lock().remove(id);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.inner.channels.read().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
