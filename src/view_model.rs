//! Base for presentation-layer models.

use std::fmt;
use std::sync::Arc;

use crate::bus::{GameEvent, GameEventBus};
use crate::disposable::{CompositeDisposable, Disposable, Subscription};
use crate::error::Result;
use crate::reactive::ReactiveProperty;

/// Owns the bus subscriptions and properties of one view model and releases
/// them together.
///
/// Concrete view models embed a `ViewModel` and build on it:
///
/// ```
/// use gamebus::{Disposable, GameEvent, GameEventBus, ReactiveProperty, ViewModel};
/// use std::time::SystemTime;
///
/// struct HealthChanged { current: i32 }
/// impl GameEvent for HealthChanged {
///     const KIND: &'static str = "HealthChanged";
///     fn timestamp(&self) -> SystemTime { SystemTime::UNIX_EPOCH }
/// }
///
/// struct HealthViewModel {
///     base: ViewModel,
///     health: ReactiveProperty<i32>,
/// }
///
/// impl HealthViewModel {
///     fn new(bus: GameEventBus) -> Self {
///         let base = ViewModel::new(bus);
///         let health = base.property(100);
///         let target = health.clone();
///         base.subscribe_to_event(move |e: &HealthChanged| {
///             let _ = target.set(e.current);
///         });
///         Self { base, health }
///     }
/// }
///
/// let bus = GameEventBus::new();
/// let vm = HealthViewModel::new(bus.clone());
/// bus.publish(HealthChanged { current: 85 });
/// assert_eq!(vm.health.value(), 85);
/// vm.base.dispose();
/// ```
pub struct ViewModel {
    bus: GameEventBus,
    disposables: CompositeDisposable,
}

impl ViewModel {
    pub fn new(bus: GameEventBus) -> Self {
        Self {
            bus,
            disposables: CompositeDisposable::new(),
        }
    }

    pub fn bus(&self) -> &GameEventBus {
        &self.bus
    }

    /// Subscribe to `E` for the lifetime of this view model.
    ///
    /// The returned handle may be disposed early; otherwise the subscription
    /// ends when the view model is disposed. Handles disposed early are
    /// forgotten on the next call.
    pub fn subscribe_to_event<E, F>(&self, on_next: F) -> Arc<Subscription>
    where
        E: GameEvent,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.disposables.prune();
        let subscription = Arc::new(self.bus.subscribe(on_next));
        self.disposables.push(subscription.clone());
        subscription
    }

    /// Release `resource` together with this view model.
    pub fn own<D: Disposable + 'static>(&self, resource: D) {
        self.disposables.add_owned(resource);
    }

    /// Create a property that is disposed with this view model.
    pub fn property<T>(&self, initial: T) -> ReactiveProperty<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        let property = ReactiveProperty::new(initial);
        self.disposables.add_owned(property.clone());
        property
    }

    pub fn get_value<T>(&self, property: &ReactiveProperty<T>) -> T
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        property.value()
    }

    pub fn set_value<T>(&self, property: &ReactiveProperty<T>, value: T) -> Result<()>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        property.set(value)
    }

    /// Resources currently owned.
    pub fn owned_count(&self) -> usize {
        self.disposables.len()
    }
}

/// Disposing releases everything the view model owns. The bus itself is
/// shared and stays alive.
impl Disposable for ViewModel {
    fn dispose(&self) {
        self.disposables.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.disposables.is_disposed()
    }
}

impl fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModel")
            .field("owned", &self.owned_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
