//! Disposable lifetimes.
//!
//! Every registration in this crate (bus subscriptions, property observers,
//! collection observers) hands back something that can be released. The
//! pieces here give those handles a common shape and let an owner release
//! them together:
//!
//! ```text
//! ViewModel
//!   └── CompositeDisposable ──┬── Subscription (GameEventBus<HealthChanged>)
//!                             ├── Subscription (ReactiveProperty<i32>)
//!                             └── ReactiveProperty<bool>
//! ```
//!
//! Releasing the composite releases everything it owns, exactly once.

mod composite;
mod subscription;

pub use composite::CompositeDisposable;
pub use subscription::Subscription;

/// A resource whose release can be requested explicitly.
///
/// `dispose` must be idempotent: the second and later calls are no-ops.
pub trait Disposable: Send + Sync {
    /// Release the resource.
    fn dispose(&self);

    /// Whether `dispose` already ran.
    fn is_disposed(&self) -> bool;
}

/// Extension for handing a disposable over to a [`CompositeDisposable`].
///
/// ```
/// use gamebus::{CompositeDisposable, DisposableExt, Subscription};
///
/// let owner = CompositeDisposable::new();
/// Subscription::new(|| println!("released")).add_to(&owner);
/// assert_eq!(owner.len(), 1);
/// ```
pub trait DisposableExt: Disposable + Sized + 'static {
    /// Move `self` into `composite`. If the composite is already disposed the
    /// resource is released immediately.
    fn add_to(self, composite: &CompositeDisposable) {
        composite.add_owned(self);
    }
}

impl<D: Disposable + 'static> DisposableExt for D {}
