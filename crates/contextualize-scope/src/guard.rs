//! Monitored scope guards.
//!
//! Entering a scope produces a [`ScopeGuard`] owned by the entering thread
//! and a shared [`ScopeRecord`] handed to the watchdog. The record outlives
//! the guard: after the thread leaves the scope the watchdog may still act
//! on it until a sweep finds it expired.

use parking_lot::Mutex;
use std::cmp::Ordering as CmpOrdering;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use uuid::Uuid;

use contextualize_deadline::DeadlineSource;

use crate::config::MAX_NOTIFY_DELAY;
use crate::error::{ScopeError, ScopeResult};
use crate::report::OverrunReport;
use crate::sink::{LogSink, TracingSink};
use crate::watchdog::ScopeWatchdog;

/// Callback run on the watchdog thread once an overrun is confirmed.
///
/// Whatever the callback needs is captured by the closure.
pub type DiagnosticFn = Box<dyn FnOnce() -> anyhow::Result<String> + Send + 'static>;

/// Result of asking a record to fire its notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationOutcome {
    /// The record had already been triggered; nothing was logged.
    AlreadyTriggered,
    /// The record was triggered while not expired; nothing was logged.
    NotExpired,
    /// The record was triggered without a report by policy.
    Suppressed,
    /// A report was logged.
    Reported,
    /// A report was logged, but the diagnostic callback failed.
    DiagnosticFailed,
}

impl NotificationOutcome {
    /// Whether an entry was handed to the log sink.
    #[must_use]
    pub fn is_reported(self) -> bool {
        matches!(self, Self::Reported | Self::DiagnosticFailed)
    }
}

/// State shared between a scope guard and the watchdog.
///
/// Records order by deadline alone. Two records with the same deadline
/// compare equal even when their label, message and id differ.
pub struct ScopeRecord {
    id: Uuid,
    label: String,
    message: String,
    deadline: Instant,
    notify_delay: Duration,
    diagnostic: Mutex<Option<DiagnosticFn>>,
    exited: AtomicBool,
    triggered: AtomicBool,
}

impl ScopeRecord {
    /// Create a record with an already computed deadline.
    ///
    /// `notify_delay` is capped at [`MAX_NOTIFY_DELAY`].
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        message: impl Into<String>,
        deadline: Instant,
        notify_delay: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            message: message.into(),
            deadline,
            notify_delay: notify_delay.min(MAX_NOTIFY_DELAY),
            diagnostic: Mutex::new(None),
            exited: AtomicBool::new(false),
            triggered: AtomicBool::new(false),
        }
    }

    /// Unique identifier of this scope entry.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Short name of the guarded operation.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Description surfaced if the scope overruns.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Instant the scope was expected to finish by.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Grace period past the deadline before an overrun is reported.
    #[must_use]
    pub fn notify_delay(&self) -> Duration {
        self.notify_delay
    }

    /// Instant after which the record counts as expired.
    ///
    /// Falls back to the bare deadline when `deadline + notify_delay` is not
    /// representable, so every record eventually expires.
    #[must_use]
    pub fn report_after(&self) -> Instant {
        self.deadline
            .checked_add(self.notify_delay)
            .unwrap_or(self.deadline)
    }

    /// Whether `now` is strictly past `deadline + notify_delay`.
    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.report_after()
    }

    /// Whether the owning thread has left the scope.
    #[must_use]
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    /// Whether notification has fired or been suppressed.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Whether a diagnostic callback is attached and not yet consumed.
    #[must_use]
    pub fn has_diagnostic(&self) -> bool {
        self.diagnostic.lock().is_some()
    }

    /// Attach a diagnostic callback, replacing any previous one.
    pub fn set_diagnostic<F>(&self, diagnostic: F)
    where
        F: FnOnce() -> anyhow::Result<String> + Send + 'static,
    {
        *self.diagnostic.lock() = Some(Box::new(diagnostic));
    }

    pub(crate) fn mark_exited(&self) {
        self.exited.store(true, Ordering::Release);
    }

    /// Mark the record triggered without logging anything.
    pub(crate) fn suppress(&self) -> NotificationOutcome {
        if self.triggered.swap(true, Ordering::AcqRel) {
            NotificationOutcome::AlreadyTriggered
        } else {
            self.diagnostic.lock().take();
            NotificationOutcome::Suppressed
        }
    }

    /// Fire the overrun notification once.
    ///
    /// The first call sets `triggered`. If the record is still expired at
    /// `now` the diagnostic callback (if any) runs on the calling thread and
    /// a single report is handed to `sink`. Later calls do nothing. A
    /// callback that errors or panics is contained and recorded in the
    /// report instead. A sink that panics is contained too and the report
    /// goes to [`TracingSink`].
    pub fn trigger_notification_at(&self, now: Instant, sink: &dyn LogSink) -> NotificationOutcome {
        if self.triggered.swap(true, Ordering::AcqRel) {
            return NotificationOutcome::AlreadyTriggered;
        }
        if !self.is_expired_at(now) {
            return NotificationOutcome::NotExpired;
        }

        let diagnostic = self.diagnostic.lock().take();
        let mut report = OverrunReport::new(&self.label, &self.message);
        if let Some(diagnostic) = diagnostic {
            report = match run_diagnostic(diagnostic) {
                Ok(output) => report.with_diagnostic(output),
                Err(cause) => {
                    tracing::warn!(
                        scope_id = %self.id,
                        label = %self.label,
                        cause = %cause,
                        "Diagnostic capture failed for expired monitored scope"
                    );
                    report.with_diagnostic_failure(cause)
                }
            };
        }

        deliver(&self.label, &report.render(), sink);

        if report.is_diagnostic_failure() {
            NotificationOutcome::DiagnosticFailed
        } else {
            NotificationOutcome::Reported
        }
    }
}

fn deliver(label: &str, text: &str, sink: &dyn LogSink) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sink.error(text))) {
        tracing::warn!(
            label = %label,
            sink = ?sink,
            cause = %panic_message("log sink", payload.as_ref()),
            "Log sink failed; report forwarded to tracing"
        );
        TracingSink.error(text);
    }
}

fn run_diagnostic(diagnostic: DiagnosticFn) -> Result<String, String> {
    match panic::catch_unwind(AssertUnwindSafe(diagnostic)) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(payload) => Err(panic_message("diagnostic", payload.as_ref())),
    }
}

fn panic_message(what: &str, payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("{what} panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("{what} panicked: {msg}")
    } else {
        format!("{what} panicked")
    }
}

impl PartialEq for ScopeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline
    }
}

impl Eq for ScopeRecord {}

impl PartialOrd for ScopeRecord {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScopeRecord {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.deadline.cmp(&other.deadline)
    }
}

impl std::fmt::Debug for ScopeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeRecord")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("deadline", &self.deadline)
            .field("notify_delay", &self.notify_delay)
            .field("has_diagnostic", &self.has_diagnostic())
            .field("exited", &self.has_exited())
            .field("triggered", &self.is_triggered())
            .finish()
    }
}

/// Handle held by a thread while it is inside a monitored scope.
///
/// Dropping the guard marks the scope exited, on normal return, early
/// return and panic unwinding alike. It does not withdraw the scope from the
/// watchdog.
///
/// # Example
///
/// ```rust
/// use contextualize_scope::prelude::*;
/// use std::time::Duration;
///
/// let watchdog = ScopeWatchdog::new(WatchdogConfig::default());
/// let mut timeout = TimeoutContext::new(Duration::from_secs(30));
///
/// {
///     let scope = ScopeGuard::enter(&watchdog, "RunCommand", "Running command on node", &mut timeout)?;
///     scope.set_diagnostic(|| Ok("node status: busy".to_string()));
///     // guarded work
/// }
/// assert_eq!(watchdog.pending_len(), 1);
/// # Ok::<(), ScopeError>(())
/// ```
#[derive(Debug)]
pub struct ScopeGuard {
    record: Arc<ScopeRecord>,
    watchdog: Arc<ScopeWatchdog>,
}

impl ScopeGuard {
    /// Enter a monitored scope using the watchdog's default notify delay.
    ///
    /// # Errors
    ///
    /// Same as [`ScopeGuardBuilder::enter`].
    pub fn enter<S>(
        watchdog: &Arc<ScopeWatchdog>,
        label: impl Into<String>,
        message: impl Into<String>,
        source: &mut S,
    ) -> ScopeResult<Self>
    where
        S: DeadlineSource + ?Sized,
    {
        Self::builder(label, message).enter(watchdog, source)
    }

    /// Enter a monitored scope tracked by the process-wide watchdog.
    ///
    /// # Errors
    ///
    /// Same as [`ScopeGuard::enter`].
    pub fn enter_global<S>(
        label: impl Into<String>,
        message: impl Into<String>,
        source: &mut S,
    ) -> ScopeResult<Self>
    where
        S: DeadlineSource + ?Sized,
    {
        Self::enter(ScopeWatchdog::global(), label, message, source)
    }

    /// Start building a scope entry with non-default options.
    #[must_use]
    pub fn builder(label: impl Into<String>, message: impl Into<String>) -> ScopeGuardBuilder {
        ScopeGuardBuilder {
            label: label.into(),
            message: message.into(),
            notify_delay: None,
            diagnostic: None,
        }
    }

    /// Shared record tracked by the watchdog.
    #[must_use]
    pub fn record(&self) -> &Arc<ScopeRecord> {
        &self.record
    }

    /// Unique identifier of this scope entry.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.record.id()
    }

    /// Short name of the guarded operation.
    #[must_use]
    pub fn label(&self) -> &str {
        self.record.label()
    }

    /// Description surfaced if the scope overruns.
    #[must_use]
    pub fn message(&self) -> &str {
        self.record.message()
    }

    /// Instant the scope is expected to finish by.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.record.deadline()
    }

    /// Grace period past the deadline before an overrun is reported.
    #[must_use]
    pub fn notify_delay(&self) -> Duration {
        self.record.notify_delay()
    }

    /// Always false while the guard is alive.
    #[must_use]
    pub fn has_exited(&self) -> bool {
        self.record.has_exited()
    }

    /// Whether notification already fired for this scope.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.record.is_triggered()
    }

    /// Whether the scope is past `deadline + notify_delay` on the watchdog clock.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.record.is_expired_at(self.watchdog.now())
    }

    /// Attach a diagnostic callback, replacing any previous one.
    pub fn set_diagnostic<F>(&self, diagnostic: F)
    where
        F: FnOnce() -> anyhow::Result<String> + Send + 'static,
    {
        self.record.set_diagnostic(diagnostic);
    }

    /// Fire the overrun notification through the watchdog's clock and sink.
    ///
    /// See [`ScopeRecord::trigger_notification_at`].
    pub fn trigger_notification(&self) -> NotificationOutcome {
        self.watchdog.notify(&self.record)
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.record.mark_exited();
    }
}

/// Builder for entering a scope with a custom notify delay or an upfront
/// diagnostic callback.
pub struct ScopeGuardBuilder {
    label: String,
    message: String,
    notify_delay: Option<Duration>,
    diagnostic: Option<DiagnosticFn>,
}

impl ScopeGuardBuilder {
    /// Override the watchdog's default notify delay for this scope.
    #[must_use]
    pub fn notify_delay(mut self, delay: Duration) -> Self {
        self.notify_delay = Some(delay);
        self
    }

    /// Attach a diagnostic callback at entry.
    #[must_use]
    pub fn diagnostic<F>(mut self, diagnostic: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<String> + Send + 'static,
    {
        self.diagnostic = Some(Box::new(diagnostic));
        self
    }

    /// Mark begin on `source`, compute the deadline and register with
    /// `watchdog`.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::EmptyLabel`] for an empty label,
    /// [`ScopeError::NotifyDelayTooLong`] for a notify delay above
    /// [`MAX_NOTIFY_DELAY`] and [`ScopeError::DeadlineUnavailable`] when the
    /// source has no deadline after begin is marked.
    pub fn enter<S>(self, watchdog: &Arc<ScopeWatchdog>, source: &mut S) -> ScopeResult<ScopeGuard>
    where
        S: DeadlineSource + ?Sized,
    {
        if self.label.is_empty() {
            return Err(ScopeError::EmptyLabel);
        }
        let notify_delay = self
            .notify_delay
            .unwrap_or(watchdog.config().notify_delay);
        if notify_delay > MAX_NOTIFY_DELAY {
            return Err(ScopeError::notify_delay_too_long(self.label, notify_delay));
        }

        source.mark_begin();
        let deadline = source
            .end_time()
            .ok_or_else(|| ScopeError::deadline_unavailable(&self.label))?;

        let record = ScopeRecord::new(self.label, self.message, deadline, notify_delay);
        if let Some(diagnostic) = self.diagnostic {
            *record.diagnostic.lock() = Some(diagnostic);
        }
        let record = Arc::new(record);
        watchdog.register(Arc::clone(&record));

        Ok(ScopeGuard {
            record,
            watchdog: Arc::clone(watchdog),
        })
    }
}

impl std::fmt::Debug for ScopeGuardBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuardBuilder")
            .field("label", &self.label)
            .field("message", &self.message)
            .field("notify_delay", &self.notify_delay)
            .field("has_diagnostic", &self.diagnostic.is_some())
            .finish()
    }
}
