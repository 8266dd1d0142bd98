//! Handlers, filters and the per-subscriber fault boundary.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

/// Error a fallible handler may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a fallible handler.
pub type HandlerResult = Result<(), HandlerError>;

/// A subscriber callback with identity.
///
/// Clones share identity: registering a clone of a callback that is already
/// registered for the same discriminator is a no-op.
pub struct Callback<T> {
    handler: Arc<dyn Fn(&T) -> HandlerResult + Send + Sync>,
}

impl<T: 'static> Callback<T> {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(move |event: &T| {
                handler(event);
                Ok(())
            }),
        }
    }

    /// A callback whose errors are logged by the bus instead of being
    /// returned to the publisher.
    pub fn fallible<F>(handler: F) -> Self
    where
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl<T> Callback<T> {
    /// Whether both handles refer to the same registered function.
    pub fn same_as(&self, other: &Callback<T>) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.handler) as *const (),
            Arc::as_ptr(&other.handler) as *const (),
        )
    }

    fn call(&self, event: &T) -> HandlerResult {
        (self.handler)(event)
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback")
            .field(&(Arc::as_ptr(&self.handler) as *const ()))
            .finish()
    }
}

/// Predicate run right before a subscriber's handler; `false` skips the
/// handler for that event only.
pub struct Filter<T> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: 'static> Filter<T> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Both filters must accept.
    pub fn and(self, other: Filter<T>) -> Self {
        Self::new(move |event: &T| self.accepts(event) && other.accepts(event))
    }
}

impl<T> Filter<T> {
    fn accepts(&self, event: &T) -> bool {
        (self.predicate)(event)
    }
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

/// A fault raised by one subscriber during fan-out. Contained by the bus.
#[derive(Debug, Error)]
pub enum DispatchFault {
    #[error("filter panicked: {message}")]
    FilterPanicked { message: String },
    #[error("handler panicked: {message}")]
    HandlerPanicked { message: String },
    #[error("handler failed: {source}")]
    HandlerFailed { source: HandlerError },
}

/// Tally of one fan-out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that ran to completion.
    pub delivered: usize,
    /// Subscribers skipped because their filter rejected the event.
    pub filtered: usize,
    /// Subscribers whose filter or handler faulted.
    pub faults: usize,
}

pub(crate) enum Outcome {
    Delivered,
    Filtered,
    Faulted(DispatchFault),
}

/// Run one subscriber: filter first, then handler. Panics and errors become
/// a [`DispatchFault`]; a faulting filter counts as a reject.
pub(crate) fn invoke<T>(callback: &Callback<T>, filter: Option<&Filter<T>>, event: &T) -> Outcome {
    if let Some(filter) = filter {
        match catch_unwind(AssertUnwindSafe(|| filter.accepts(event))) {
            Ok(true) => {}
            Ok(false) => return Outcome::Filtered,
            Err(payload) => {
                return Outcome::Faulted(DispatchFault::FilterPanicked {
                    message: panic_message(payload.as_ref()),
                })
            }
        }
    }
    match catch_unwind(AssertUnwindSafe(|| callback.call(event))) {
        Ok(Ok(())) => Outcome::Delivered,
        Ok(Err(source)) => Outcome::Faulted(DispatchFault::HandlerFailed { source }),
        Err(payload) => Outcome::Faulted(DispatchFault::HandlerPanicked {
            message: panic_message(payload.as_ref()),
        }),
    }
}

impl DispatchReport {
    pub(crate) fn record(&mut self, outcome: Outcome, event: &str, subscriber: u64) {
        match outcome {
            Outcome::Delivered => self.delivered += 1,
            Outcome::Filtered => self.filtered += 1,
            Outcome::Faulted(fault) => {
                self.faults += 1;
                warn!(event, subscriber, error = %fault, "subscriber fault contained");
            }
        }
    }

    pub(crate) fn merge(&mut self, other: DispatchReport) {
        self.delivered += other.delivered;
        self.filtered += other.filtered;
        self.faults += other.faults;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
