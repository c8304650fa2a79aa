//! Property-based tests for deadline arithmetic.

use contextualize_deadline::prelude::*;
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #[test]
    fn test_deadline_is_begin_plus_timeout(
        timeout_ms in 0..10_000_000u64,
        offset_ms in 0..10_000_000u64,
    ) {
        let clock = ManualClock::new();
        clock.advance(Duration::from_millis(offset_ms));

        let mut ctx = TimeoutContext::with_clock(Duration::from_millis(timeout_ms), clock.clone());
        ctx.mark_begin();

        prop_assert_eq!(ctx.end_time(), Some(clock.now() + Duration::from_millis(timeout_ms)));
    }

    #[test]
    fn test_elapsed_plus_remaining_covers_timeout(
        timeout_ms in 1..100_000u64,
        step_ms in 0..100_000u64,
    ) {
        let clock = ManualClock::new();
        let timeout = Duration::from_millis(timeout_ms);
        let mut ctx = TimeoutContext::with_clock(timeout, clock.clone());
        ctx.mark_begin();
        clock.advance(Duration::from_millis(step_ms));

        if step_ms <= timeout_ms {
            prop_assert_eq!(ctx.elapsed() + ctx.remaining(), timeout);
            prop_assert!(!ctx.is_timed_out());
        } else {
            prop_assert_eq!(ctx.remaining(), Duration::ZERO);
            prop_assert!(ctx.is_timed_out());
        }
    }
}
