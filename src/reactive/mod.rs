//! Reactive values.
//!
//! - [`ReactiveProperty`]: one value, one notification per distinct change.
//! - [`ReactiveCollection`]: ordered items, one notification per mutation.
//! - [`ReactiveCommand`]: a triggerable action with an observable enable flag.
//! - [`ExclusiveCommand`]: an owned action that never overlaps itself.
//! - [`Subject`]: the synchronous multicast channel the others are built on.
//!
//! Notifications are synchronous: by the time a mutating call returns, every
//! subscriber registered before the call has been notified.

mod collection;
mod command;
mod property;
mod subject;
mod validation;

pub use collection::{ChangeKind, CollectionChange, ReactiveCollection};
pub use command::{ExclusiveCommand, ReactiveCommand};
pub use property::{BatchGuard, ReactiveProperty};
pub use subject::Subject;
pub use validation::{ValidationResult, ValidationRule, Validator};
