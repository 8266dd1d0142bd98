use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::Disposable;
use crate::error::{ReactiveError, Result};

/// Owns a set of disposables and releases them together.
///
/// - Everything owned is released exactly once, by [`clear`](Self::clear) or
///   [`dispose`](Self::dispose).
/// - After `dispose`, anything added is released on the spot instead of being
///   kept.
/// - A registry never owns itself.
///
/// Mutations run under one internal lock. Release actions run after the lock
/// is dropped, so registries nested inside each other cannot deadlock.
///
/// Dropping a registry does not dispose it, but any [`Subscription`](super::Subscription)
/// it owns cancels itself when dropped.
#[derive(Default)]
pub struct CompositeDisposable {
    state: Mutex<CompositeState>,
}

#[derive(Default)]
struct CompositeState {
    resources: Vec<Arc<dyn Disposable>>,
    disposed: bool,
}

fn same_resource(a: &Arc<dyn Disposable>, b: &Arc<dyn Disposable>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl CompositeDisposable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a shared resource.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::InvalidArgument`] if `resource` is this registry.
    pub fn add(&self, resource: Arc<dyn Disposable>) -> Result<()> {
        if self.is_self(&resource) {
            return Err(ReactiveError::invalid_argument(
                "a CompositeDisposable cannot own itself",
            ));
        }
        self.push(resource);
        Ok(())
    }

    /// Take ownership of a value. An owned value can never alias the registry,
    /// so this cannot fail.
    pub fn add_owned<D: Disposable + 'static>(&self, resource: D) {
        self.push(Arc::new(resource));
    }

    /// Add several shared resources. Stops at the first rejected one; the
    /// resources before it stay registered.
    pub fn add_range<I>(&self, resources: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<dyn Disposable>>,
    {
        for resource in resources {
            self.add(resource)?;
        }
        Ok(())
    }

    /// Stop owning `resource` without releasing it.
    pub fn remove(&self, resource: &Arc<dyn Disposable>) -> bool {
        let mut state = self.state.lock();
        match state
            .resources
            .iter()
            .position(|owned| same_resource(owned, resource))
        {
            Some(index) => {
                state.resources.remove(index);
                true
            }
            None => false,
        }
    }

    /// Release and forget everything currently owned. The registry stays usable.
    pub fn clear(&self) {
        let released = std::mem::take(&mut self.state.lock().resources);
        release_all(released);
    }

    pub fn len(&self) -> usize {
        self.state.lock().resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Own `resource`, or release it right away if already disposed.
    pub(crate) fn push(&self, resource: Arc<dyn Disposable>) {
        let mut state = self.state.lock();
        if state.disposed {
            drop(state);
            debug!("resource added to a disposed CompositeDisposable, releasing it");
            resource.dispose();
            return;
        }
        state.resources.push(resource);
    }

    /// Forget resources that were already disposed elsewhere. Returns how
    /// many were dropped.
    ///
    /// `is_disposed` is queried with the lock released, since an owned
    /// resource may be another registry.
    pub(crate) fn prune(&self) -> usize {
        let owned = self.state.lock().resources.clone();
        let dead: Vec<_> = owned
            .into_iter()
            .filter(|resource| resource.is_disposed())
            .collect();
        if dead.is_empty() {
            return 0;
        }
        let mut state = self.state.lock();
        let before = state.resources.len();
        state
            .resources
            .retain(|owned| !dead.iter().any(|gone| same_resource(owned, gone)));
        before - state.resources.len()
    }

    fn is_self(&self, resource: &Arc<dyn Disposable>) -> bool {
        std::ptr::eq(
            Arc::as_ptr(resource) as *const (),
            self as *const Self as *const (),
        )
    }
}

fn release_all(resources: Vec<Arc<dyn Disposable>>) {
    for resource in resources {
        resource.dispose();
    }
}

impl Disposable for CompositeDisposable {
    fn dispose(&self) {
        let released = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            std::mem::take(&mut state.resources)
        };
        debug!(count = released.len(), "disposing CompositeDisposable");
        release_all(released);
    }

    fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }
}

impl fmt::Debug for CompositeDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CompositeDisposable")
            .field("len", &state.resources.len())
            .field("disposed", &state.disposed)
            .finish()
    }
}
