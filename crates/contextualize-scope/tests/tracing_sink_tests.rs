//! Tests that the default sink emits overrun reports as tracing errors.

use contextualize_scope::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Debug, Clone, Default)]
struct CapturedEvents(Arc<Mutex<Vec<(Level, String, String)>>>);

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for CapturedEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0.lock().push((
            *event.metadata().level(),
            event.metadata().target().to_string(),
            visitor.0,
        ));
    }
}

#[test]
fn test_tracing_sink_emits_error_event() {
    let captured = CapturedEvents::default();
    let subscriber = tracing_subscriber::registry().with(captured.clone());

    tracing::subscriber::with_default(subscriber, || {
        TracingSink.error("MonitoredScope(op): Timeout waiting for thread to exit monitored scope.");
    });

    let events = captured.0.lock();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events.first(),
        Some((level, target, message))
            if *level == Level::ERROR
                && target == "contextualize::scope"
                && message.contains("MonitoredScope(op)")
    ));
}

#[test]
fn test_default_watchdog_reports_through_tracing() -> Result<(), ScopeError> {
    let captured = CapturedEvents::default();
    let subscriber = tracing_subscriber::registry().with(captured.clone());
    let clock = ManualClock::new();

    tracing::subscriber::with_default(subscriber, || -> Result<(), ScopeError> {
        let config = WatchdogConfig::builder().notify_delay(Duration::ZERO).build()?;
        let watchdog = ScopeWatchdog::with_clock(config, clock.clone());
        let mut timeout = TimeoutContext::with_clock(Duration::from_secs(1), clock.clone());
        let _scope = ScopeGuard::enter(&watchdog, "Traced", "Reported via tracing", &mut timeout)?;
        clock.advance(Duration::from_secs(2));
        watchdog.sweep();
        Ok(())
    })?;

    let events = captured.0.lock();
    let errors: Vec<_> = events
        .iter()
        .filter(|(level, _, _)| *level == Level::ERROR)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors.first().is_some_and(|(_, _, message)| {
        message.contains("MonitoredScope(Traced)") && message.contains("MESSAGE: Reported via tracing")
    }));
    Ok(())
}
