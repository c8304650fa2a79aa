//! Property-based tests for deadline ordering and expiry.

use contextualize_scope::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn watchdog_on(clock: &ManualClock) -> (Arc<ScopeWatchdog>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let config = WatchdogConfig {
        notify_delay: Duration::ZERO,
        ..Default::default()
    };
    let watchdog = ScopeWatchdog::with_parts(config, Arc::new(clock.clone()), sink.clone());
    (watchdog, sink)
}

proptest! {
    #[test]
    fn test_pending_sorted_regardless_of_insertion_order(
        timeouts in prop::collection::vec(0..10_000u64, 1..64),
    ) {
        let clock = ManualClock::new();
        let (watchdog, _sink) = watchdog_on(&clock);

        for ms in &timeouts {
            let mut timeout = TimeoutContext::with_clock(Duration::from_millis(*ms), clock.clone());
            let entered = ScopeGuard::enter(&watchdog, "prop", "prop", &mut timeout);
            prop_assert!(entered.is_ok());
        }

        let deadlines: Vec<_> = watchdog.pending_snapshot().into_iter().map(|s| s.deadline).collect();
        prop_assert_eq!(deadlines.len(), timeouts.len());
        prop_assert!(deadlines.is_sorted());
    }

    #[test]
    fn test_sweep_reports_exactly_the_passed_deadlines(
        timeouts in prop::collection::vec(0..1_000u64, 0..64),
        sweep_at in 0..1_200u64,
    ) {
        let clock = ManualClock::new();
        let start = clock.now();
        let (watchdog, sink) = watchdog_on(&clock);

        for ms in &timeouts {
            let mut timeout = TimeoutContext::with_clock(Duration::from_millis(*ms), clock.clone());
            drop(ScopeGuard::enter(&watchdog, "prop", "prop", &mut timeout));
        }

        let outcome = watchdog.sweep_at(start + Duration::from_millis(sweep_at));
        let expected = timeouts.iter().filter(|ms| **ms < sweep_at).count();

        prop_assert_eq!(outcome.reported.len(), expected);
        prop_assert_eq!(outcome.remaining, timeouts.len() - expected);
        prop_assert_eq!(sink.len(), expected);
        if let Some(next) = watchdog.next_deadline() {
            prop_assert!(next >= start + Duration::from_millis(sweep_at));
        }
    }

    #[test]
    fn test_expiry_is_strictly_after_deadline_plus_delay(
        timeout_ms in 0..100_000u64,
        delay_ms in 0..100_000u64,
        probe_ms in 0..250_000u64,
    ) {
        let clock = ManualClock::new();
        let start = clock.now();
        let (watchdog, _sink) = watchdog_on(&clock);
        let mut timeout = TimeoutContext::with_clock(Duration::from_millis(timeout_ms), clock.clone());
        let scope = ScopeGuard::builder("prop", "prop")
            .notify_delay(Duration::from_millis(delay_ms))
            .enter(&watchdog, &mut timeout);
        prop_assert!(scope.is_ok());

        let record = watchdog.pending_snapshot();
        prop_assert_eq!(record.len(), 1);

        clock.set(start + Duration::from_millis(probe_ms));
        let expected = probe_ms > timeout_ms + delay_ms;
        if let Ok(scope) = scope {
            prop_assert_eq!(scope.is_expired(), expected);
            prop_assert_eq!(scope.is_expired(), expected);
            prop_assert!(!scope.is_triggered());
        }
    }
}
