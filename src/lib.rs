//! In-process messaging and reactive state for game presentation code.
//!
//! - [`GameEventBus`]: typed publish/subscribe, routed by event type.
//! - [`EventBus`] / [`QueuedEventBus`]: name-keyed events with history,
//!   delivered immediately or drained once per tick by priority.
//! - [`ReactiveProperty`], [`ReactiveCollection`], [`ReactiveCommand`]:
//!   observable values.
//! - [`Subscription`] / [`CompositeDisposable`]: release registrations
//!   individually or together.
//! - [`ViewModel`]: owns all of the above for one screen or component.
//! - [`StateStore`]: named game-wide values with snapshots.

pub mod bus;
pub mod disposable;
mod error;
pub mod reactive;
pub mod state;
mod view_model;

pub use bus::{
    BoundedHistory, BusConfig, Callback, DispatchFault, DispatchReport, DrainResult, EventBus,
    EventStream, Filter, GameEvent, GameEventBus, HandlerError, HandlerResult, NamedEvent,
    QueueConfig, QueueState, QueuedEventBus, WeakEventManager, WeakHandler,
};
#[cfg(feature = "drain-thread")]
pub use bus::{DrainLoop, DrainStats};
pub use disposable::{CompositeDisposable, Disposable, DisposableExt, Subscription};
pub use error::{ReactiveError, Result};
pub use reactive::{
    BatchGuard, ChangeKind, CollectionChange, ExclusiveCommand, ReactiveCollection,
    ReactiveCommand, ReactiveProperty, Subject, ValidationResult, ValidationRule, Validator,
};
pub use state::{SnapshotError, StateSnapshot, StateStore, StateStoreConfig, StateValue};
pub use view_model::ViewModel;
