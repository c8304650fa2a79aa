//! Watchdog configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ScopeError, ScopeResult};

/// Default period between automatic sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Default grace period added to a deadline before an overrun is reported.
pub const DEFAULT_NOTIFY_DELAY: Duration = Duration::from_secs(60);

/// Longest accepted notify delay.
///
/// Pending scopes are swept in deadline order, so a scope with a long grace
/// period holds back the reports of every scope queued behind it until its
/// own limit passes.
pub const MAX_NOTIFY_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// What a sweep does with an expired scope whose thread already exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrunPolicy {
    /// Report every expired scope, exited or not.
    ///
    /// Expiry is purely deadline driven: a scope that finished quickly but
    /// was not swept until after its deadline and notify delay is still
    /// reported as an overrun.
    #[default]
    ReportOnDeadline,
    /// Drop expired scopes whose thread already exited without reporting.
    SkipExited,
}

impl std::fmt::Display for OverrunPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrunPolicy::ReportOnDeadline => write!(f, "report-on-deadline"),
            OverrunPolicy::SkipExited => write!(f, "skip-exited"),
        }
    }
}

/// Scope watchdog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Period between automatic sweeps.
    pub sweep_interval: Duration,
    /// Grace period applied to scopes entered without an explicit one.
    pub notify_delay: Duration,
    /// Handling of expired scopes that have already exited.
    pub overrun_policy: OverrunPolicy,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            notify_delay: DEFAULT_NOTIFY_DELAY,
            overrun_policy: OverrunPolicy::default(),
        }
    }
}

impl WatchdogConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the sweep interval is zero or the notify delay
    /// exceeds [`MAX_NOTIFY_DELAY`].
    pub fn validate(&self) -> ScopeResult<()> {
        if self.sweep_interval.is_zero() {
            return Err(ScopeError::invalid_configuration(
                "sweep_interval must be greater than 0",
            ));
        }
        if self.notify_delay > MAX_NOTIFY_DELAY {
            return Err(ScopeError::invalid_configuration(format!(
                "notify_delay must not exceed {}s",
                MAX_NOTIFY_DELAY.as_secs()
            )));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> WatchdogConfigBuilder {
        WatchdogConfigBuilder::default()
    }
}

/// Builder for `WatchdogConfig`.
#[derive(Debug, Default)]
pub struct WatchdogConfigBuilder {
    config: WatchdogConfig,
}

impl WatchdogConfigBuilder {
    /// Set the sweep interval.
    #[must_use]
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Set the default notify delay.
    #[must_use]
    pub fn notify_delay(mut self, delay: Duration) -> Self {
        self.config.notify_delay = delay;
        self
    }

    /// Set the overrun policy.
    #[must_use]
    pub fn overrun_policy(mut self, policy: OverrunPolicy) -> Self {
        self.config.overrun_policy = policy;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> ScopeResult<WatchdogConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
