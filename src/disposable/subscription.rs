use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::Disposable;

type ReleaseAction = Box<dyn FnOnce() + Send>;

/// Handle for one live registration.
///
/// Owns no data, only the ability to cancel. Disposing runs the release
/// action at most once; dropping the handle disposes it too, so keep it
/// (or move it into a [`CompositeDisposable`](super::CompositeDisposable))
/// for as long as the registration should live.
#[must_use = "dropping a Subscription cancels it; call `detach()` to keep it registered"]
pub struct Subscription {
    release: Mutex<Option<ReleaseAction>>,
    disposed: AtomicBool,
}

impl Subscription {
    /// Wrap a release action.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Mutex::new(Some(Box::new(release))),
            disposed: AtomicBool::new(false),
        }
    }

    /// A subscription that is already disposed (e.g. returned by a disposed bus).
    pub fn empty() -> Self {
        Self {
            release: Mutex::new(None),
            disposed: AtomicBool::new(true),
        }
    }

    /// Give up the handle without cancelling. The registration then lives as
    /// long as its source does.
    pub fn detach(self) {
        self.release.lock().take();
    }
}

impl Disposable for Subscription {
    fn dispose(&self) {
        let release = self.release.lock().take();
        if let Some(release) = release {
            self.disposed.store(true, Ordering::SeqCst);
            release();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
