//! Watchdog statistics tracking.
//!
//! Counters are updated from registering threads and from the sweeper, so
//! they are plain atomics read together into a [`StatsSnapshot`].

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters kept by a scope watchdog.
#[derive(Debug, Default)]
pub struct WatchdogStats {
    registered: AtomicU64,
    reported: AtomicU64,
    suppressed: AtomicU64,
    diagnostic_failures: AtomicU64,
    sweeps: AtomicU64,
}

impl WatchdogStats {
    /// Create zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_registration(&self) {
        self.registered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_report(&self, diagnostic_failed: bool) {
        self.reported.fetch_add(1, Ordering::Relaxed);
        if diagnostic_failed {
            self.diagnostic_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep(&self) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters, together with the current pending count.
    #[must_use]
    pub fn snapshot(&self, pending: usize) -> StatsSnapshot {
        StatsSnapshot {
            registered: self.registered.load(Ordering::Relaxed),
            reported: self.reported.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            diagnostic_failures: self.diagnostic_failures.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            pending,
        }
    }
}

/// Point-in-time copy of watchdog statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Scopes registered since the watchdog was created.
    pub registered: u64,
    /// Overrun reports handed to the log sink.
    pub reported: u64,
    /// Expired scopes removed without a report.
    pub suppressed: u64,
    /// Reports whose diagnostic callback failed.
    pub diagnostic_failures: u64,
    /// Completed sweeps.
    pub sweeps: u64,
    /// Scopes still waiting for their deadline.
    pub pending: usize,
}

impl StatsSnapshot {
    /// Scopes removed from the pending set, reported or suppressed.
    #[must_use]
    pub fn resolved(&self) -> u64 {
        self.reported.saturating_add(self.suppressed)
    }

    /// Share of resolved scopes that were reported, as a percentage.
    ///
    /// Returns 0.0 if nothing has been resolved yet.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "counters stay far below 2^52 in practice"
    )]
    pub fn report_rate(&self) -> f64 {
        let resolved = self.resolved();
        if resolved == 0 {
            0.0
        } else {
            (self.reported as f64 / resolved as f64) * 100.0
        }
    }
}
