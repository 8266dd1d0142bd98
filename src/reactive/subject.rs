use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::disposable::Subscription;

type NextFn<T> = Arc<dyn Fn(&T) + Send + Sync>;
type CompletedFn = Box<dyn FnOnce() + Send>;

struct Observer<T> {
    id: u64,
    on_next: NextFn<T>,
    on_completed: Option<CompletedFn>,
}

struct SubjectState<T> {
    observers: Vec<Observer<T>>,
    completed: bool,
}

struct SubjectInner<T> {
    state: Mutex<SubjectState<T>>,
    next_id: AtomicU64,
}

impl<T> SubjectInner<T> {
    fn remove(&self, id: u64) {
        self.state.lock().observers.retain(|observer| observer.id != id);
    }
}

/// Synchronous multicast channel.
///
/// Observers are notified on the caller's thread, in registration order. The
/// observer list is copied before notifying, so observers may subscribe or
/// unsubscribe from inside a notification.
pub struct Subject<T> {
    inner: Arc<SubjectInner<T>>,
}

impl<T: 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                state: Mutex::new(SubjectState {
                    observers: Vec::new(),
                    completed: false,
                }),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn subscribe<F>(&self, on_next: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.register(Arc::new(on_next), None)
    }

    /// Like [`subscribe`](Self::subscribe), also running `on_completed` once
    /// when the subject completes. On an already completed subject
    /// `on_completed` runs right away and an empty subscription is returned.
    pub fn subscribe_with_completion<F, C>(&self, on_next: F, on_completed: C) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
        C: FnOnce() + Send + 'static,
    {
        self.register(Arc::new(on_next), Some(Box::new(on_completed)))
    }

    fn register(&self, on_next: NextFn<T>, on_completed: Option<CompletedFn>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut state = self.inner.state.lock();
            if !state.completed {
                state.observers.push(Observer {
                    id,
                    on_next,
                    on_completed,
                });
                drop(state);
                let weak: Weak<SubjectInner<T>> = Arc::downgrade(&self.inner);
                return Subscription::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.remove(id);
                    }
                });
            }
        }
        if let Some(on_completed) = on_completed {
            on_completed();
        }
        Subscription::empty()
    }

    /// Push `value` to every current observer. Returns how many were notified.
    pub fn next(&self, value: &T) -> usize {
        let snapshot: Vec<NextFn<T>> = {
            let state = self.inner.state.lock();
            if state.completed {
                return 0;
            }
            state
                .observers
                .iter()
                .map(|observer| Arc::clone(&observer.on_next))
                .collect()
        };
        for on_next in &snapshot {
            on_next(value);
        }
        snapshot.len()
    }

    /// Complete the subject: completion callbacks run once, observers are
    /// dropped, later `next` calls do nothing. Returns `false` if it was
    /// already completed.
    pub fn complete(&self) -> bool {
        let observers = {
            let mut state = self.inner.state.lock();
            if state.completed {
                return false;
            }
            state.completed = true;
            std::mem::take(&mut state.observers)
        };
        for observer in observers {
            if let Some(on_completed) = observer.on_completed {
                on_completed();
            }
        }
        true
    }

    pub fn is_completed(&self) -> bool {
        self.inner.state.lock().completed
    }

    pub fn observer_count(&self) -> usize {
        self.inner.state.lock().observers.len()
    }
}

impl<T: 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Subject")
            .field("observers", &state.observers.len())
            .field("completed", &state.completed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disposable::Disposable;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn notifies_in_registration_order() {
        let subject = Subject::<i32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let a = {
            let seen = Arc::clone(&seen);
            subject.subscribe(move |v| seen.lock().push(("a", *v)))
        };
        let b = {
            let seen = Arc::clone(&seen);
            subject.subscribe(move |v| seen.lock().push(("b", *v)))
        };

        assert_eq!(subject.next(&7), 2);
        assert_eq!(*seen.lock(), vec![("a", 7), ("b", 7)]);
        drop((a, b));
    }

    #[test]
    fn disposed_subscription_stops_delivery() {
        let subject = Subject::<i32>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&count);
        let sub = subject.subscribe(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        subject.next(&1);
        sub.dispose();
        subject.next(&2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn complete_runs_completion_once() {
        let subject = Subject::<i32>::new();
        let completed = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&completed);
        let _sub = subject.subscribe_with_completion(
            |_| {},
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert!(subject.complete());
        assert!(!subject.complete());
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(subject.next(&1), 0);
    }

    #[test]
    fn subscribe_after_complete_completes_immediately() {
        let subject = Subject::<i32>::new();
        subject.complete();

        let completed = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&completed);
        let sub = subject.subscribe_with_completion(
            |_| {},
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert!(sub.is_disposed());
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn observer_can_unsubscribe_during_notification() {
        let subject = Subject::<i32>::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let count = Arc::new(AtomicUsize::new(0));

        let sub = {
            let slot = Arc::clone(&slot);
            let count = Arc::clone(&count);
            subject.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                if let Some(sub) = slot.lock().take() {
                    sub.dispose();
                }
            })
        };
        *slot.lock() = Some(sub);

        subject.next(&1);
        subject.next(&2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
