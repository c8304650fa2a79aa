//! Error types for monitored scopes.
//!
//! Overruns themselves are never errors: they are reported through the
//! configured log sink. These errors cover misuse at scope entry and
//! sweeper lifecycle problems.

use thiserror::Error;

/// Errors that can occur while entering a scope or driving the sweeper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// A scope was entered with an empty label.
    #[error("Monitored scope label must not be empty")]
    EmptyLabel,

    /// A scope asked for a notify delay longer than the watchdog accepts.
    #[error("Notify delay of {delay:?} for monitored scope '{label}' exceeds the maximum")]
    NotifyDelayTooLong {
        /// Label of the rejected scope.
        label: String,
        /// Requested notify delay.
        delay: std::time::Duration,
    },

    /// The deadline source produced no deadline after begin was marked.
    #[error("No deadline available for monitored scope '{0}'")]
    DeadlineUnavailable(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A sweeper thread is already attached to this watchdog.
    #[error("A sweeper is already running for this watchdog")]
    SweeperAlreadyRunning,

    /// The sweeper thread could not be spawned.
    #[error("Failed to spawn sweeper thread: {0}")]
    SweeperSpawnFailed(String),

    /// The sweeper thread panicked before it could be joined.
    #[error("Sweeper thread terminated abnormally")]
    SweeperPanicked,
}

impl ScopeError {
    /// Create a deadline unavailable error.
    #[must_use]
    pub fn deadline_unavailable(label: impl Into<String>) -> Self {
        Self::DeadlineUnavailable(label.into())
    }

    /// Create a notify delay too long error.
    #[must_use]
    pub fn notify_delay_too_long(label: impl Into<String>, delay: std::time::Duration) -> Self {
        Self::NotifyDelayTooLong {
            label: label.into(),
            delay,
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Create a sweeper spawn failure error.
    #[must_use]
    pub fn sweeper_spawn_failed(reason: impl Into<String>) -> Self {
        Self::SweeperSpawnFailed(reason.into())
    }
}

/// A specialized `Result` type for monitored scope operations.
pub type ScopeResult<T> = std::result::Result<T, ScopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScopeError::deadline_unavailable("RunCommand");
        assert!(err.to_string().contains("RunCommand"));

        let err = ScopeError::invalid_configuration("sweep_interval must be greater than 0");
        assert!(err.to_string().contains("sweep_interval"));
    }

    #[test]
    fn test_error_constructors() {
        let err = ScopeError::sweeper_spawn_failed("resource exhausted");
        assert!(matches!(err, ScopeError::SweeperSpawnFailed(_)));
        assert_eq!(ScopeError::EmptyLabel, ScopeError::EmptyLabel);

        let err = ScopeError::notify_delay_too_long("Drain", std::time::Duration::MAX);
        assert!(matches!(err, ScopeError::NotifyDelayTooLong { .. }));
        assert!(err.to_string().contains("Drain"));
    }
}
