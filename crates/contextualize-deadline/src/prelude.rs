//! Prelude for contextualize-deadline.
//!
//! ```rust
//! use contextualize_deadline::prelude::*;
//! use std::time::Duration;
//!
//! let mut ctx = TimeoutContext::new(Duration::from_millis(250));
//! ctx.mark_begin();
//! assert!(ctx.end_time().is_some());
//! ```

pub use crate::clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use crate::error::{DeadlineError, DeadlineResult};
pub use crate::timeout::{DeadlineSource, TimeoutContext};
