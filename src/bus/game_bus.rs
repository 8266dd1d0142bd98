use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use super::callback::{Callback, DispatchReport, Filter};
use super::channel::{self, Channel, CompletedFn, Registration};
use super::config::BusConfig;
use super::event::GameEvent;
use crate::disposable::Subscription;

/// Type-erased view of a channel so channels of every event type can share
/// one map.
trait ErasedChannel: Send + Sync {
    fn kind(&self) -> &'static str;
    fn complete(&self) -> usize;
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

struct TypedChannel<E> {
    channel: Mutex<Channel<E>>,
}

impl<E: GameEvent> ErasedChannel for TypedChannel<E> {
    fn kind(&self) -> &'static str {
        E::KIND
    }

    fn complete(&self) -> usize {
        channel::complete(&self.channel)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

struct BusInner {
    config: BusConfig,
    channels: RwLock<HashMap<TypeId, Arc<dyn ErasedChannel>>>,
    next_id: AtomicU64,
    disposed: AtomicBool,
}

/// Type-indexed, synchronous publish/subscribe hub.
///
/// Events are routed by their Rust type. `publish` delivers on the calling
/// thread to every subscriber registered for that type, in registration
/// order, before it returns. A failing subscriber is logged and counted but
/// never stops delivery to the others.
///
/// The bus is a cheap handle: clones share the same subscribers and history.
#[derive(Clone)]
pub struct GameEventBus {
    inner: Arc<BusInner>,
}

impl GameEventBus {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(BusInner {
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

    /// Deliver `event` to every current subscriber of `E`.
    ///
    /// After [`dispose`](Self::dispose) this logs and does nothing.
    pub fn publish<E: GameEvent>(&self, event: E) -> DispatchReport {
        if self.is_disposed() {
            warn!(event = E::KIND, "publish on disposed bus ignored");
            return DispatchReport::default();
        }

        let channel = if self.inner.config.history_capacity.is_some() {
            self.channel_or_create::<E>()
        } else {
            self.channel::<E>()
        };
        let Some(channel) = channel else {
            return DispatchReport::default();
        };

        let event = Arc::new(event);
        let subscribers = {
            let mut channel = channel.channel.lock();
            if channel.is_closed() {
                return DispatchReport::default();
            }
            channel.record(&event);
            channel.snapshot()
        };
        channel::dispatch(E::KIND, &subscribers, &event)
    }

    /// Register a handler for `E`.
    pub fn subscribe<E, F>(&self, handler: F) -> Subscription
    where
        E: GameEvent,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe_callback(Callback::new(handler))
    }

    /// Register a handler with identity. Registering the same callback twice
    /// keeps the first registration and returns an empty subscription.
    pub fn subscribe_callback<E: GameEvent>(&self, callback: Callback<E>) -> Subscription {
        self.register(callback, None, None)
    }

    /// Register a handler that only sees events accepted by `filter`.
    pub fn subscribe_filtered<E, P, F>(&self, filter: P, handler: F) -> Subscription
    where
        E: GameEvent,
        P: Fn(&E) -> bool + Send + Sync + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(Callback::new(handler), Some(Filter::new(filter)), None)
    }

    /// Start building a subscription to `E`.
    pub fn stream<E: GameEvent>(&self) -> EventStream<E> {
        EventStream {
            bus: self.clone(),
            filter: None,
            on_completed: None,
        }
    }

    /// Remove `callback` from `E`'s subscribers. Returns whether it was there.
    pub fn unsubscribe<E: GameEvent>(&self, callback: &Callback<E>) -> bool {
        match self.channel::<E>() {
            Some(channel) => channel.channel.lock().remove_callback(callback),
            None => false,
        }
    }

    /// Recent events of type `E`, oldest first.
    pub fn history<E: GameEvent>(&self) -> Vec<Arc<E>> {
        self.channel::<E>()
            .map(|channel| channel.channel.lock().history())
            .unwrap_or_default()
    }

    pub fn subscriber_count<E: GameEvent>(&self) -> usize {
        self.channel::<E>()
            .map(|channel| channel.channel.lock().len())
            .unwrap_or(0)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Complete every channel and drop all subscribers and history.
    ///
    /// Completion callbacks run once; later calls do nothing.
    pub fn dispose(&self) {
        let channels: Vec<_> = {
            let mut channels = self.inner.channels.write();
            if self.inner.disposed.swap(true, Ordering::SeqCst) {
                return;
            }
            channels.drain().map(|(_, channel)| channel).collect()
        };

        let mut completed = 0;
        for channel in channels {
            let count = channel.complete();
            debug!(event = channel.kind(), subscribers = count, "channel completed");
            completed += count;
        }
        debug!(subscribers = completed, "event bus disposed");
    }

    fn register<E: GameEvent>(
        &self,
        callback: Callback<E>,
        filter: Option<Filter<E>>,
        on_completed: Option<CompletedFn>,
    ) -> Subscription {
        let Some(channel) = self.channel_or_create::<E>() else {
            debug!(event = E::KIND, "subscribe on disposed bus");
            if let Some(on_completed) = on_completed {
                on_completed();
            }
            return Subscription::empty();
        };

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let registration = channel.channel.lock().register(id, callback, filter, on_completed);
        match registration {
            Registration::Added(id) => {
                let channel = Arc::downgrade(&channel);
                Subscription::new(move || release(&channel, id))
            }
            Registration::Existing(existing) => {
                debug!(
                    event = E::KIND,
                    subscriber = existing,
                    "callback already subscribed"
                );
                Subscription::empty()
            }
            Registration::Closed(on_completed) => {
                if let Some(on_completed) = on_completed {
                    on_completed();
                }
                Subscription::empty()
            }
        }
    }

    fn channel<E: GameEvent>(&self) -> Option<Arc<TypedChannel<E>>> {
        let erased = self.inner.channels.read()
            .get(&TypeId::of::<E>())
            .cloned()?;
        downcast::<E>(erased)
    }

    /// Get or create `E`'s channel. `None` once the bus is disposed.
    fn channel_or_create<E: GameEvent>(&self) -> Option<Arc<TypedChannel<E>>> {
        if let Some(channel) = self.channel::<E>() {
            return Some(channel);
        }

        let erased = {
            let mut channels = self.inner.channels.write();
            if self.is_disposed() {
                return None;
            }
            let history = self.inner.config.history_capacity;
            Arc::clone(channels.entry(TypeId::of::<E>()).or_insert_with(|| {
                Arc::new(TypedChannel::<E> {
                    channel: Mutex::new(Channel::new(history)),
                })
            }))
        };
        downcast::<E>(erased)
    }
}

fn downcast<E: GameEvent>(erased: Arc<dyn ErasedChannel>) -> Option<Arc<TypedChannel<E>>> {
    let kind = erased.kind();
    match erased.as_any().downcast::<TypedChannel<E>>() {
        Ok(channel) => Some(channel),
        Err(_) => {
            warn!(event = E::KIND, found = kind, "channel type mismatch");
            None
        }
    }
}

fn release<E>(channel: &Weak<TypedChannel<E>>, id: u64) {
    if let Some(channel) = channel.upgrade() {
        channel.channel.lock().remove(id);
    }
}

impl Default for GameEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GameEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEventBus")
            .field("channels", &self.inner.channels.read().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Builder for a subscription to one event type.
///
/// ```
/// # use gamebus::{GameEvent, GameEventBus};
/// # use std::time::SystemTime;
/// # struct Damage { amount: u32 }
/// # impl GameEvent for Damage {
/// #     const KIND: &'static str = "Damage";
/// #     fn timestamp(&self) -> SystemTime { SystemTime::UNIX_EPOCH }
/// # }
/// let bus = GameEventBus::new();
/// let _big_hits = bus
///     .stream::<Damage>()
///     .filter(|d| d.amount >= 50)
///     .subscribe(|d| println!("ouch: {}", d.amount));
/// ```
#[must_use = "a stream does nothing until subscribed"]
pub struct EventStream<E> {
    bus: GameEventBus,
    filter: Option<Filter<E>>,
    on_completed: Option<CompletedFn>,
}

impl<E: GameEvent> EventStream<E> {
    /// Only pass events accepted by `predicate`. Repeated calls combine.
    pub fn filter<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let next = Filter::new(predicate);
        self.filter = Some(match self.filter.take() {
            Some(current) => current.and(next),
            None => next,
        });
        self
    }

    /// Run `f` once when the bus is disposed, or right away if it already is.
    pub fn on_completed<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_completed = Some(Box::new(f));
        self
    }

    pub fn subscribe<F>(self, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe_callback(Callback::new(handler))
    }

    pub fn subscribe_callback(self, callback: Callback<E>) -> Subscription {
        self.bus.register(callback, self.filter, self.on_completed)
    }
}
