//! The scope watchdog.
//!
//! [`ScopeWatchdog`] keeps every registered scope in a deadline-ordered
//! queue and, on each sweep, reports the scopes whose deadline plus notify
//! delay has passed. Because the queue is sorted, a sweep stops at the first
//! scope that is not yet expired.
//!
//! # Concurrency
//!
//! Registration and the queue scan take the same short lock. Expired
//! records are popped under the lock and notified after it is released, so
//! a slow diagnostic callback never blocks threads entering new scopes.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use uuid::Uuid;

use contextualize_deadline::{Clock, SharedClock, SystemClock};

use crate::config::{OverrunPolicy, WatchdogConfig};
use crate::guard::{NotificationOutcome, ScopeRecord};
use crate::sink::{LogSink, TracingSink};
use crate::stats::{StatsSnapshot, WatchdogStats};

/// What a single sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Ids of scopes reported in this sweep, in deadline order.
    pub reported: Vec<Uuid>,
    /// Ids of expired scopes removed without a report.
    pub suppressed: Vec<Uuid>,
    /// Number of reports whose diagnostic callback failed.
    pub failed_diagnostics: usize,
    /// Scopes still pending after the sweep.
    pub remaining: usize,
}

impl SweepOutcome {
    /// Number of scopes removed from the pending queue.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.reported.len().saturating_add(self.suppressed.len())
    }
}

/// Label and deadline of a pending scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingScope {
    /// Unique identifier of the scope entry.
    pub id: Uuid,
    /// Short name of the guarded operation.
    pub label: String,
    /// Instant the scope was expected to finish by.
    pub deadline: Instant,
    /// Whether the owning thread has left the scope.
    pub exited: bool,
}

/// Deadline-ordered tracker of monitored scopes.
pub struct ScopeWatchdog {
    config: WatchdogConfig,
    clock: SharedClock,
    sink: Arc<dyn LogSink>,
    pending: Mutex<VecDeque<Arc<ScopeRecord>>>,
    stats: WatchdogStats,
    pub(crate) sweeper_active: AtomicBool,
}

static GLOBAL_WATCHDOG: OnceLock<Arc<ScopeWatchdog>> = OnceLock::new();

impl ScopeWatchdog {
    /// Create a watchdog on the system clock that logs through `tracing`.
    #[must_use]
    pub fn new(config: WatchdogConfig) -> Arc<Self> {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(TracingSink))
    }

    /// Create a watchdog reading time from `clock`.
    #[must_use]
    pub fn with_clock(config: WatchdogConfig, clock: impl Clock + 'static) -> Arc<Self> {
        Self::with_parts(config, Arc::new(clock), Arc::new(TracingSink))
    }

    /// Create a watchdog from an explicit clock and log sink.
    #[must_use]
    pub fn with_parts(
        config: WatchdogConfig,
        clock: SharedClock,
        sink: Arc<dyn LogSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            clock,
            sink,
            pending: Mutex::new(VecDeque::new()),
            stats: WatchdogStats::new(),
            sweeper_active: AtomicBool::new(false),
        })
    }

    /// The process-wide watchdog.
    ///
    /// Created with the default configuration on first use, with its sweeper
    /// thread already running. Every later call returns the same instance.
    pub fn global() -> &'static Arc<Self> {
        GLOBAL_WATCHDOG.get_or_init(|| {
            let watchdog = Self::new(WatchdogConfig::default());
            match watchdog.start_sweeper() {
                Ok(handle) => handle.detach(),
                Err(err) => {
                    tracing::error!(error = %err, "Global scope watchdog has no sweeper");
                }
            }
            watchdog
        })
    }

    /// Current reading of the watchdog clock.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// The watchdog configuration.
    #[must_use]
    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    /// Add a record to the pending queue, keeping deadline order.
    ///
    /// Records with equal deadlines keep their registration order.
    pub fn register(&self, record: Arc<ScopeRecord>) {
        let now = self.clock.now();
        let due_in_ms = record.deadline().saturating_duration_since(now).as_millis();
        let scope_id = record.id();
        let label = record.label().to_owned();
        {
            let mut pending = self.pending.lock();
            let index = pending.partition_point(|existing| existing.as_ref() <= record.as_ref());
            pending.insert(index, record);
        }
        self.stats.record_registration();

        tracing::debug!(
            scope_id = %scope_id,
            label = %label,
            due_in_ms = due_in_ms,
            "Monitored scope registered"
        );
    }

    /// Sweep at the current clock reading.
    pub fn sweep(&self) -> SweepOutcome {
        self.sweep_at(self.clock.now())
    }

    /// Report and remove every pending scope expired at `now`.
    ///
    /// Scopes are handled in deadline order and the scan stops at the first
    /// scope that is not expired. Diagnostic failures are contained per
    /// scope and never abort the sweep.
    pub fn sweep_at(&self, now: Instant) -> SweepOutcome {
        let (expired, remaining) = {
            let mut pending = self.pending.lock();
            let mut expired = Vec::new();
            while pending.front().is_some_and(|head| head.is_expired_at(now)) {
                if let Some(head) = pending.pop_front() {
                    expired.push(head);
                }
            }
            (expired, pending.len())
        };

        let mut outcome = SweepOutcome {
            remaining,
            ..SweepOutcome::default()
        };

        for record in expired {
            let result = if self.config.overrun_policy == OverrunPolicy::SkipExited
                && record.has_exited()
            {
                record.suppress()
            } else {
                record.trigger_notification_at(now, self.sink.as_ref())
            };
            self.tally(&record, result, &mut outcome);
        }

        self.stats.record_sweep();
        tracing::trace!(
            reported = outcome.reported.len(),
            suppressed = outcome.suppressed.len(),
            remaining = outcome.remaining,
            "Scope sweep complete"
        );
        outcome
    }

    fn tally(&self, record: &ScopeRecord, result: NotificationOutcome, outcome: &mut SweepOutcome) {
        match result {
            NotificationOutcome::Reported | NotificationOutcome::DiagnosticFailed => {
                let failed = result == NotificationOutcome::DiagnosticFailed;
                if failed {
                    outcome.failed_diagnostics = outcome.failed_diagnostics.saturating_add(1);
                }
                self.stats.record_report(failed);
                outcome.reported.push(record.id());
            }
            NotificationOutcome::Suppressed => {
                self.stats.record_suppressed();
                outcome.suppressed.push(record.id());
                tracing::debug!(
                    scope_id = %record.id(),
                    label = %record.label(),
                    "Expired monitored scope already exited; report skipped"
                );
            }
            // Triggered out of band before the sweep reached it.
            NotificationOutcome::AlreadyTriggered => {
                self.stats.record_suppressed();
                outcome.suppressed.push(record.id());
            }
            // Records are popped only once expired at the same instant the
            // trigger is evaluated, and expiry is monotonic in `now`.
            NotificationOutcome::NotExpired => {
                tracing::debug!(
                    scope_id = %record.id(),
                    label = %record.label(),
                    "Swept monitored scope was not expired at trigger time"
                );
                self.stats.record_suppressed();
                outcome.suppressed.push(record.id());
            }
        }
    }

    /// Fire `record`'s notification at the current clock reading.
    ///
    /// Counts toward statistics when a report is produced. The record stays
    /// in the pending queue until a sweep removes it.
    pub fn notify(&self, record: &ScopeRecord) -> NotificationOutcome {
        let result = record.trigger_notification_at(self.clock.now(), self.sink.as_ref());
        if result.is_reported() {
            self.stats
                .record_report(result == NotificationOutcome::DiagnosticFailed);
        }
        result
    }

    /// Number of scopes waiting in the queue.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Deadline of the earliest pending scope.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.lock().front().map(|record| record.deadline())
    }

    /// Copy of the pending queue in deadline order.
    #[must_use]
    pub fn pending_snapshot(&self) -> Vec<PendingScope> {
        self.pending
            .lock()
            .iter()
            .map(|record| PendingScope {
                id: record.id(),
                label: record.label().to_owned(),
                deadline: record.deadline(),
                exited: record.has_exited(),
            })
            .collect()
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.pending_len())
    }

    /// Whether a sweeper thread is attached.
    #[must_use]
    pub fn is_sweeper_running(&self) -> bool {
        self.sweeper_active.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ScopeWatchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeWatchdog")
            .field("config", &self.config)
            .field("pending", &self.pending_len())
            .field("sink", &self.sink)
            .field("sweeper_active", &self.is_sweeper_running())
            .finish_non_exhaustive()
    }
}
