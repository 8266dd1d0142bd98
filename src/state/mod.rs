//! Game-wide named values and their persisted snapshots.
//!
//! [`StateStore`] keeps the current value and a bounded history per key.
//! [`StateStore::snapshot`] produces a [`StateSnapshot`] that can be written
//! as a JSON document or as compact `bitcode` bytes, and restored later.

mod snapshot;
mod store;
mod value;

pub use snapshot::{SnapshotError, StateSnapshot};
pub use store::{StateStore, StateStoreConfig};
pub use value::StateValue;
