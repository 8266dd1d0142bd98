use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tracing::debug;

use super::subject::Subject;
use super::validation::Validator;
use crate::disposable::{CompositeDisposable, Disposable, Subscription};
use crate::error::{ReactiveError, Result};

type Check<T> = Arc<dyn Fn(&T) -> std::result::Result<(), String> + Send + Sync>;

struct Cell<T> {
    value: T,
    validator: Option<Check<T>>,
    batch_depth: usize,
    disposed: bool,
}

struct PropertyInner<T> {
    cell: Mutex<Cell<T>>,
    /// Serializes writers across store + notify. Re-entrant so a change
    /// handler may write the same property on the same thread.
    gate: ReentrantMutex<()>,
    subject: Subject<T>,
    /// Links feeding derived properties created by `map`.
    links: CompositeDisposable,
}

/// A value cell that notifies subscribers when the value changes.
///
/// Assigning a value equal to the current one does nothing. Assigning a
/// different value stores it and then notifies every subscriber, in
/// subscription order, before `set` returns.
///
/// The handle is cheap to clone; clones share the same cell.
///
/// ```
/// use gamebus::ReactiveProperty;
/// use std::sync::{Arc, Mutex};
///
/// let health = ReactiveProperty::new(100);
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let _sub = health.subscribe(move |v| sink.lock().unwrap().push(*v));
///
/// health.set(100).unwrap(); // unchanged, no notification
/// health.set(85).unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![85]);
/// ```
pub struct ReactiveProperty<T> {
    inner: Arc<PropertyInner<T>>,
}

impl<T> ReactiveProperty<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(PropertyInner {
                cell: Mutex::new(Cell {
                    value: initial,
                    validator: None,
                    batch_depth: 0,
                    disposed: false,
                }),
                gate: ReentrantMutex::new(()),
                subject: Subject::new(),
                links: CompositeDisposable::new(),
            }),
        }
    }

    /// Current value.
    pub fn value(&self) -> T {
        self.inner.cell.lock().value.clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.cell.lock().value)
    }

    /// Assign a new value.
    ///
    /// # Errors
    ///
    /// - [`ReactiveError::Disposed`] once the property has been disposed.
    /// - [`ReactiveError::Validation`] if the validator rejects `value`; the
    ///   current value is kept and nobody is notified.
    pub fn set(&self, value: T) -> Result<()> {
        let _writer = self.inner.gate.lock();

        let check = {
            let cell = self.inner.cell.lock();
            if cell.disposed {
                return Err(ReactiveError::disposed("ReactiveProperty"));
            }
            cell.validator.clone()
        };
        if let Some(check) = check {
            check(&value).map_err(ReactiveError::validation)?;
        }

        let notify = {
            let mut cell = self.inner.cell.lock();
            if cell.value == value {
                return Ok(());
            }
            cell.value = value.clone();
            cell.batch_depth == 0
        };
        if notify {
            self.inner.subject.next(&value);
        }
        Ok(())
    }

    /// Run `f` on every subsequent change. Drop or dispose the returned
    /// handle to stop.
    pub fn subscribe<F>(&self, on_next: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inner.subject.subscribe(on_next)
    }

    /// Reject future assignments for which `predicate` returns `false`.
    pub fn set_validator<F>(&self, predicate: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let check: Check<T> = Arc::new(move |value: &T| {
            if predicate(value) {
                Ok(())
            } else {
                Err("value rejected by validator".to_string())
            }
        });
        self.inner.cell.lock().validator = Some(check);
    }

    /// Validate future assignments against a rule set; the failed rule
    /// messages become the validation error's reason.
    pub fn set_rules(&self, validator: Validator<T>) {
        let check: Check<T> = Arc::new(move |value: &T| {
            let result = validator.validate(value);
            if result.is_valid() {
                Ok(())
            } else {
                Err(result.to_string())
            }
        });
        self.inner.cell.lock().validator = Some(check);
    }

    pub fn clear_validator(&self) {
        self.inner.cell.lock().validator = None;
    }

    /// Whether `value` would pass the current validator.
    pub fn validate(&self, value: &T) -> bool {
        let check = self.inner.cell.lock().validator.clone();
        check.map_or(true, |check| check(value).is_ok())
    }

    /// Suspend notifications. Calls nest.
    pub fn begin_update(&self) {
        self.inner.cell.lock().batch_depth += 1;
    }

    /// Close one [`begin_update`](Self::begin_update). When the outermost
    /// batch closes, subscribers get exactly one notification carrying the
    /// final value, whether or not it differs from the value before the batch.
    pub fn end_update(&self) {
        let _writer = self.inner.gate.lock();
        let value = {
            let mut cell = self.inner.cell.lock();
            if cell.batch_depth > 0 {
                cell.batch_depth -= 1;
                if cell.batch_depth > 0 {
                    return;
                }
            }
            if cell.disposed {
                return;
            }
            cell.value.clone()
        };
        self.inner.subject.next(&value);
    }

    /// Scoped [`begin_update`](Self::begin_update); the batch ends when the
    /// guard drops.
    pub fn batch(&self) -> BatchGuard<'_, T> {
        self.begin_update();
        BatchGuard { property: self }
    }

    /// Derive a property that follows this one through `f`.
    ///
    /// The link is released when either side is disposed. A derived property
    /// cut off from its source keeps its last value.
    pub fn map<R, F>(&self, f: F) -> ReactiveProperty<R>
    where
        R: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        let derived = ReactiveProperty::new(self.with(&f));
        let target = derived.clone();
        let link: Arc<dyn Disposable> = Arc::new(self.subscribe(move |value| {
            if let Err(err) = target.set(f(value)) {
                debug!(error = %err, "derived property rejected update");
            }
        }));
        self.inner.links.push(Arc::clone(&link));
        derived.inner.links.push(link);
        derived
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subject.observer_count()
    }
}

impl<T> Disposable for ReactiveProperty<T>
where
    T: Send + Sync + 'static,
{
    fn dispose(&self) {
        {
            let mut cell = self.inner.cell.lock();
            if cell.disposed {
                return;
            }
            cell.disposed = true;
        }
        self.inner.subject.complete();
        self.inner.links.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.inner.cell.lock().disposed
    }
}

impl<T> Clone for ReactiveProperty<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ReactiveProperty<T>
where
    T: Clone + PartialEq + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self.inner.cell.lock();
        f.debug_struct("ReactiveProperty")
            .field("value", &cell.value)
            .field("disposed", &cell.disposed)
            .finish()
    }
}

/// Ends a batch update on drop. See [`ReactiveProperty::batch`].
#[must_use = "the batch ends as soon as the guard is dropped"]
pub struct BatchGuard<'a, T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    property: &'a ReactiveProperty<T>,
}

impl<T> Drop for BatchGuard<'_, T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.property.end_update();
    }
}
