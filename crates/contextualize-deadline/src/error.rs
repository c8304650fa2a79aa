//! Error types for deadline computation.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while computing a deadline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeadlineError {
    /// The deadline was read before the begin instant was marked.
    #[error("Deadline requested before begin was marked")]
    NotStarted,

    /// The begin instant plus the timeout is not representable.
    #[error("Deadline overflow: timeout of {0:?} cannot be added to the begin instant")]
    Overflow(Duration),
}

impl DeadlineError {
    /// Create an overflow error for the given timeout.
    #[must_use]
    pub fn overflow(timeout: Duration) -> Self {
        Self::Overflow(timeout)
    }
}

/// A specialized `Result` type for deadline operations.
pub type DeadlineResult<T> = std::result::Result<T, DeadlineError>;
