use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::property::ReactiveProperty;
use super::subject::Subject;
use crate::disposable::{Disposable, Subscription};

/// An action presentation code can trigger, gated by an observable
/// "can execute" flag.
///
/// `ReactiveCommand<()>` is the parameterless form.
pub struct ReactiveCommand<T = ()> {
    executed: Subject<T>,
    can_execute: ReactiveProperty<bool>,
    disposed: AtomicBool,
}

impl<T: Send + Sync + 'static> ReactiveCommand<T> {
    pub fn new() -> Self {
        Self {
            executed: Subject::new(),
            can_execute: ReactiveProperty::new(true),
            disposed: AtomicBool::new(false),
        }
    }

    /// Notify subscribers with `parameter` if the command is executable.
    /// Returns whether it ran.
    pub fn execute(&self, parameter: T) -> bool {
        if self.is_disposed() || !self.can_execute() {
            return false;
        }
        self.executed.next(&parameter);
        true
    }

    pub fn subscribe<F>(&self, on_execute: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.executed.subscribe(on_execute)
    }

    pub fn can_execute(&self) -> bool {
        self.can_execute.value()
    }

    pub fn set_can_execute(&self, enabled: bool) {
        // Only fails once disposed, when the flag no longer matters.
        let _ = self.can_execute.set(enabled);
    }

    pub fn can_execute_changed<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.can_execute.subscribe(on_change)
    }
}

impl<T: Send + Sync + 'static> Default for ReactiveCommand<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Disposable for ReactiveCommand<T> {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.executed.complete();
        self.can_execute.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

type Action<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A command that owns its action and refuses to start while a previous run
/// is still in progress.
///
/// `is_executing` is observable, so a button can grey itself out for the
/// duration of a long save or load. The flag is cleared even if the action
/// panics.
pub struct ExclusiveCommand<T = ()> {
    action: Action<T>,
    running: AtomicBool,
    is_executing: ReactiveProperty<bool>,
    disposed: AtomicBool,
}

impl<T: Send + Sync + 'static> ExclusiveCommand<T> {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
            running: AtomicBool::new(false),
            is_executing: ReactiveProperty::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// Run the action with `parameter` unless a run is already in progress
    /// (on any thread, including from inside the action). Returns whether it
    /// ran.
    pub fn execute(&self, parameter: T) -> bool {
        if self.is_disposed() {
            return false;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let _running = RunningGuard { command: self };
        let _ = self.is_executing.set(true);
        (self.action)(&parameter);
        true
    }

    pub fn can_execute(&self) -> bool {
        !self.is_disposed() && !self.is_executing()
    }

    pub fn is_executing(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Observe the executing flag: `true` when a run starts, `false` when it
    /// ends.
    pub fn is_executing_changed<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.is_executing.subscribe(on_change)
    }
}

struct RunningGuard<'a, T: Send + Sync + 'static> {
    command: &'a ExclusiveCommand<T>,
}

impl<T: Send + Sync + 'static> Drop for RunningGuard<'_, T> {
    fn drop(&mut self) {
        let _ = self.command.is_executing.set(false);
        self.command.running.store(false, Ordering::Release);
    }
}

impl<T: Send + Sync + 'static> Disposable for ExclusiveCommand<T> {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.is_executing.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}
