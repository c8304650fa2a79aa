//! # contextualize-scope
//!
//! Monitored scopes: mark a span of code as "should complete within a
//! bounded time" and report an overrun only if that bound is exceeded.
//!
//! Nothing is logged when a thread enters a scope. Instead the scope's label,
//! message and an optional diagnostic callback are handed to a
//! [`ScopeWatchdog`]. A background sweeper checks the earliest deadlines
//! periodically and, once a scope is past its deadline plus notify delay,
//! emits a single error report from the sweeper thread. Expensive diagnostic
//! collection therefore happens off the stalled thread and only on confirmed
//! failure.
//!
//! ## Architecture
//!
//! - [`guard`] - [`ScopeGuard`] handles and the shared [`ScopeRecord`]
//! - [`watchdog`] - the deadline-ordered [`ScopeWatchdog`] and its sweep
//! - [`sweeper`] - the background sweeper thread
//! - [`report`] - overrun report formatting
//! - [`sink`] - log sinks receiving finished reports
//! - [`config`] - watchdog configuration
//! - [`stats`] - watchdog counters
//! - [`error`] - scope-specific error types
//!
//! Deadlines come from a [`DeadlineSource`], usually a [`TimeoutContext`]
//! from `contextualize-deadline`.
//!
//! ## Overrun semantics
//!
//! Expiry is purely deadline driven. Leaving a scope marks it exited but
//! does not withdraw it, so under the default
//! [`OverrunPolicy::ReportOnDeadline`] a scope that finished in time yet was
//! first swept after its deadline and notify delay is still reported.
//! [`OverrunPolicy::SkipExited`] drops such scopes silently instead.
//!
//! ## Example
//!
//! ```rust
//! use contextualize_scope::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let sink = Arc::new(MemorySink::new());
//! let config = WatchdogConfig::builder()
//!     .notify_delay(Duration::ZERO)
//!     .build()?;
//! let watchdog = ScopeWatchdog::with_parts(config, Arc::new(clock.clone()), sink.clone());
//!
//! let mut timeout = TimeoutContext::with_clock(Duration::from_secs(1), clock.clone());
//! let scope = ScopeGuard::enter(&watchdog, "RunCommand", "Running 'echo blah' on node 1", &mut timeout)?;
//! scope.set_diagnostic(|| Ok("node 1: ssh session unresponsive".to_string()));
//!
//! clock.advance(Duration::from_secs(2));
//! let outcome = watchdog.sweep();
//! assert_eq!(outcome.reported, vec![scope.id()]);
//! assert!(sink.entries().first().is_some_and(|e| e.starts_with("MonitoredScope(RunCommand)")));
//! # Ok::<(), ScopeError>(())
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod guard;
pub mod report;
pub mod sink;
pub mod stats;
pub mod sweeper;
pub mod watchdog;

pub mod prelude;

pub use config::{MAX_NOTIFY_DELAY, OverrunPolicy, WatchdogConfig, WatchdogConfigBuilder};
pub use error::{ScopeError, ScopeResult};
pub use guard::{DiagnosticFn, NotificationOutcome, ScopeGuard, ScopeGuardBuilder, ScopeRecord};
pub use report::{OverrunReport, split_and_indent_lines};
pub use sink::{LogSink, MemorySink, TracingSink};
pub use stats::{StatsSnapshot, WatchdogStats};
pub use sweeper::SweeperHandle;
pub use watchdog::{PendingScope, ScopeWatchdog, SweepOutcome};

// Re-export the deadline collaborator for convenience
pub use contextualize_deadline::{
    Clock, DeadlineSource, ManualClock, SharedClock, SystemClock, TimeoutContext,
};
