//! Event Buses - in-process publish/subscribe
//!
//! Three buses share one subscriber model: handlers with identity
//! ([`Callback`]), optional per-subscriber [`Filter`]s, cancellable
//! [`Subscription`](crate::Subscription)s and bounded per-channel history.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────┐
//! │     GameEventBus     │   │       EventBus       │
//! │  routed by TypeId    │   │  routed by name      │
//! │  publish(E)          │   │  emit_event(name, v) │
//! └──────────────────────┘   └──────────────────────┘
//!            │                          ▲
//!            │                          │ drain()
//!            │               ┌──────────────────────┐
//!            │               │    QueuedEventBus    │
//!            │               │  priority heap       │
//!            │               │  emit_event(.., pri) │
//!            │               └──────────────────────┘
//!            ▼                          ▼
//! ┌─────────────────────────────────────────────────┐
//! │  Channel per discriminator                      │
//! │  - subscribers in registration order            │
//! │  - bounded history (default 100)                │
//! │  - faults contained per subscriber              │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Immediate buses deliver on the publishing thread before `publish`/`emit`
//! returns. The queued bus only delivers from [`QueuedEventBus::drain`],
//! called once per tick by the host or by a [`DrainLoop`].

mod callback;
mod channel;
mod config;
#[cfg(feature = "drain-thread")]
mod drain_loop;
mod event;
mod game_bus;
mod history;
mod named_bus;
mod queued_bus;
mod weak;

pub use callback::{Callback, DispatchFault, DispatchReport, Filter, HandlerError, HandlerResult};
pub use config::{BusConfig, QueueConfig, DEFAULT_HISTORY_CAPACITY};
#[cfg(feature = "drain-thread")]
pub use drain_loop::{DrainLoop, DrainStats};
pub use event::{GameEvent, NamedEvent};
pub use game_bus::{EventStream, GameEventBus};
pub use history::BoundedHistory;
pub use named_bus::EventBus;
pub use queued_bus::{DrainResult, QueueState, QueuedEventBus};
pub use weak::{WeakEventManager, WeakHandler};
