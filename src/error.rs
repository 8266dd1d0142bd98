use thiserror::Error;

/// Errors surfaced synchronously to the caller of a reactive or registry operation.
///
/// Faults raised inside someone else's handler during fan-out never show up
/// here; see [`DispatchFault`](crate::bus::DispatchFault).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// The resource was already disposed.
    #[error("{resource} has been disposed")]
    Disposed { resource: &'static str },
    /// A validator rejected the value; the previous value was kept.
    #[error("validation failed: {reason}")]
    Validation { reason: String },
    /// The argument cannot be accepted (e.g. a registry asked to own itself).
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
    /// Index outside the current bounds of a collection.
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds { index: usize, len: usize },
}

impl ReactiveError {
    pub(crate) fn disposed(resource: &'static str) -> Self {
        ReactiveError::Disposed { resource }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        ReactiveError::Validation {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        ReactiveError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;
