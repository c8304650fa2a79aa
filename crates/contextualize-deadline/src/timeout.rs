//! Timeout contexts.
//!
//! A [`TimeoutContext`] turns a relative timeout into an absolute deadline
//! the moment its begin instant is marked.

use std::time::{Duration, Instant};

use crate::clock::{Clock, SharedClock, SystemClock};
use crate::error::{DeadlineError, DeadlineResult};
use std::sync::Arc;

/// Anything that can report an absolute deadline once begin is marked.
pub trait DeadlineSource {
    /// Record the current instant as the start of the guarded window.
    fn mark_begin(&mut self);

    /// Absolute deadline of the window.
    ///
    /// `None` until [`mark_begin`](Self::mark_begin) was called, or when the
    /// deadline cannot be represented.
    fn end_time(&self) -> Option<Instant>;
}

/// A fixed timeout window measured against a [`Clock`].
#[derive(Debug, Clone)]
pub struct TimeoutContext {
    timeout: Duration,
    begin: Option<Instant>,
    clock: SharedClock,
}

impl TimeoutContext {
    /// Create a timeout context on the system clock.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self::with_clock(timeout, SystemClock)
    }

    /// Create a timeout context on a caller supplied clock.
    #[must_use]
    pub fn with_clock(timeout: Duration, clock: impl Clock + 'static) -> Self {
        Self {
            timeout,
            begin: None,
            clock: Arc::new(clock),
        }
    }

    /// The configured timeout window.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Instant recorded by the last [`DeadlineSource::mark_begin`] call.
    #[must_use]
    pub fn begin_time(&self) -> Option<Instant> {
        self.begin
    }

    /// Absolute deadline, reporting why it is unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`DeadlineError::NotStarted`] before begin is marked and
    /// [`DeadlineError::Overflow`] when `begin + timeout` overflows.
    pub fn try_end_time(&self) -> DeadlineResult<Instant> {
        let begin = self.begin.ok_or(DeadlineError::NotStarted)?;
        begin
            .checked_add(self.timeout)
            .ok_or_else(|| DeadlineError::overflow(self.timeout))
    }

    /// Time elapsed since begin, zero if not started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.begin.map_or(Duration::ZERO, |begin| {
            self.clock.now().saturating_duration_since(begin)
        })
    }

    /// Time left until the deadline, zero once it has passed.
    ///
    /// Before begin is marked the whole timeout is reported as remaining.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        match self.try_end_time() {
            Ok(end) => end.saturating_duration_since(self.clock.now()),
            Err(DeadlineError::NotStarted) => self.timeout,
            Err(DeadlineError::Overflow(_)) => Duration::MAX,
        }
    }

    /// Whether the clock has moved past the deadline.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        self.try_end_time()
            .is_ok_and(|end| self.clock.now() > end)
    }
}

impl DeadlineSource for TimeoutContext {
    fn mark_begin(&mut self) {
        self.begin = Some(self.clock.now());
    }

    fn end_time(&self) -> Option<Instant> {
        self.try_end_time().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_end_time_requires_begin() {
        let ctx = TimeoutContext::new(Duration::from_secs(1));
        assert!(ctx.end_time().is_none());
        assert_eq!(ctx.try_end_time(), Err(DeadlineError::NotStarted));
        assert_eq!(ctx.remaining(), Duration::from_secs(1));
        assert!(!ctx.is_timed_out());
    }

    #[test]
    fn test_mark_begin_computes_deadline() {
        let clock = ManualClock::new();
        let mut ctx = TimeoutContext::with_clock(Duration::from_secs(2), clock.clone());

        ctx.mark_begin();
        let begin = clock.now();
        assert_eq!(ctx.begin_time(), Some(begin));
        assert_eq!(ctx.end_time(), Some(begin + Duration::from_secs(2)));
    }

    #[test]
    fn test_remarking_begin_restarts_window() {
        let clock = ManualClock::new();
        let mut ctx = TimeoutContext::with_clock(Duration::from_secs(2), clock.clone());

        ctx.mark_begin();
        clock.advance(Duration::from_secs(5));
        assert!(ctx.is_timed_out());

        ctx.mark_begin();
        assert!(!ctx.is_timed_out());
        assert_eq!(ctx.remaining(), Duration::from_secs(2));
    }

    #[test]
    fn test_timed_out_is_strict() {
        let clock = ManualClock::new();
        let mut ctx = TimeoutContext::with_clock(Duration::from_secs(1), clock.clone());
        ctx.mark_begin();

        clock.advance(Duration::from_secs(1));
        assert!(!ctx.is_timed_out());
        assert_eq!(ctx.remaining(), Duration::ZERO);

        clock.advance(Duration::from_nanos(1));
        assert!(ctx.is_timed_out());
    }

    #[test]
    fn test_overflowing_timeout() {
        let mut ctx = TimeoutContext::new(Duration::MAX);
        ctx.mark_begin();
        assert!(ctx.end_time().is_none());
        assert_eq!(
            ctx.try_end_time(),
            Err(DeadlineError::Overflow(Duration::MAX))
        );
        assert_eq!(ctx.remaining(), Duration::MAX);
        assert!(!ctx.is_timed_out());
    }

    #[test]
    fn test_elapsed_tracks_clock() {
        let clock = ManualClock::new();
        let mut ctx = TimeoutContext::with_clock(Duration::from_secs(10), clock.clone());
        assert_eq!(ctx.elapsed(), Duration::ZERO);

        ctx.mark_begin();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(ctx.elapsed(), Duration::from_millis(1500));
        assert_eq!(ctx.remaining(), Duration::from_millis(8500));
    }
}
