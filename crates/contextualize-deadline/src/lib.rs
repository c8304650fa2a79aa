//! # contextualize-deadline
//!
//! Deadline sources for monitored scopes.
//!
//! A monitored scope never measures time itself. It asks a [`DeadlineSource`]
//! to mark the instant the scope was entered and reads back the absolute
//! deadline the scope is expected to finish by. [`TimeoutContext`] is the
//! stock source: a fixed timeout window measured against a [`Clock`].
//!
//! Clocks are injectable so that deadline arithmetic can be exercised
//! deterministically with a [`ManualClock`].
//!
//! ## Example
//!
//! ```rust
//! use contextualize_deadline::prelude::*;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut ctx = TimeoutContext::with_clock(Duration::from_secs(5), clock.clone());
//! assert!(ctx.end_time().is_none());
//!
//! ctx.mark_begin();
//! assert_eq!(ctx.end_time(), Some(clock.now() + Duration::from_secs(5)));
//!
//! clock.advance(Duration::from_secs(6));
//! assert!(ctx.is_timed_out());
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod clock;
pub mod error;
pub mod timeout;

pub mod prelude;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{DeadlineError, DeadlineResult};
pub use timeout::{DeadlineSource, TimeoutContext};
