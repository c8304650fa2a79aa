//! Log sinks for overrun reports.
//!
//! A sink receives each finished report as one pre-formatted, possibly
//! multi-line string at error severity. It never sees structured fields.

use parking_lot::Mutex;
use std::fmt::Debug;

/// Destination for overrun reports.
pub trait LogSink: Send + Sync + Debug {
    /// Emit one error-level entry.
    fn error(&self, text: &str);
}

/// Sink that forwards reports to `tracing` at ERROR level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn error(&self, text: &str) {
        tracing::error!(target: "contextualize::scope", "{text}");
    }
}

/// Sink that keeps every report in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Create an empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all entries received so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Number of entries received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no entry has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Discard all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn error(&self, text: &str) {
        self.entries.lock().push(text.to_owned());
    }
}
