//! Prelude for contextualize-scope.
//!
//! This module re-exports the most commonly used types for convenient importing.
//!
//! # Example
//!
//! ```rust
//! use contextualize_scope::prelude::*;
//! use std::time::Duration;
//!
//! let watchdog = ScopeWatchdog::new(WatchdogConfig::default());
//! let mut timeout = TimeoutContext::new(Duration::from_secs(10));
//! let _scope = ScopeGuard::enter(&watchdog, "Sync", "Synchronizing inventory", &mut timeout)?;
//! # Ok::<(), ScopeError>(())
//! ```

pub use crate::config::{MAX_NOTIFY_DELAY, OverrunPolicy, WatchdogConfig, WatchdogConfigBuilder};
pub use crate::error::{ScopeError, ScopeResult};
pub use crate::guard::{NotificationOutcome, ScopeGuard, ScopeRecord};
pub use crate::sink::{LogSink, MemorySink, TracingSink};
pub use crate::stats::StatsSnapshot;
pub use crate::sweeper::SweeperHandle;
pub use crate::watchdog::{ScopeWatchdog, SweepOutcome};
pub use contextualize_deadline::{Clock, DeadlineSource, ManualClock, SystemClock, TimeoutContext};
