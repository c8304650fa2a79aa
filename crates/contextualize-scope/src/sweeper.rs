//! Background sweeper thread.
//!
//! One dedicated OS thread per watchdog calls
//! [`ScopeWatchdog::sweep`] every `sweep_interval`. The thread sleeps on a
//! condition variable so [`SweeperHandle::stop`] takes effect immediately
//! instead of waiting out the interval.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use crate::error::{ScopeError, ScopeResult};
use crate::watchdog::ScopeWatchdog;

/// Name given to sweeper threads.
pub const SWEEPER_THREAD_NAME: &str = "scope-watchdog";

#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn raise(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }
}

/// Clears the watchdog's sweeper flag when the thread exits, unwinding
/// included.
struct ActiveFlag(Arc<ScopeWatchdog>);

impl Drop for ActiveFlag {
    fn drop(&mut self) {
        self.0.sweeper_active.store(false, Ordering::Release);
    }
}

/// Owner of a running sweeper thread.
///
/// Dropping the handle stops the thread and waits for it to finish.
#[derive(Debug)]
pub struct SweeperHandle {
    signal: Arc<StopSignal>,
    thread: Option<JoinHandle<()>>,
}

impl ScopeWatchdog {
    /// Spawn the sweeper thread for this watchdog.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::SweeperAlreadyRunning`] if this watchdog already
    /// has a sweeper, [`ScopeError::InvalidConfiguration`] for a zero sweep
    /// interval, and [`ScopeError::SweeperSpawnFailed`] if the OS refuses
    /// the thread.
    pub fn start_sweeper(self: &Arc<Self>) -> ScopeResult<SweeperHandle> {
        self.config().validate()?;
        if self
            .sweeper_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ScopeError::SweeperAlreadyRunning);
        }

        let signal = Arc::new(StopSignal::default());
        let interval = self.config().sweep_interval;
        let active = ActiveFlag(Arc::clone(self));
        let thread_signal = Arc::clone(&signal);

        let spawned = thread::Builder::new()
            .name(SWEEPER_THREAD_NAME.to_string())
            .spawn(move || {
                loop {
                    {
                        let mut stopped = thread_signal.stopped.lock();
                        if !*stopped {
                            // Timing out is the normal path; a wakeup without
                            // the flag just sweeps early.
                            let _timed_out = thread_signal.wake.wait_for(&mut stopped, interval);
                        }
                        if *stopped {
                            break;
                        }
                    }
                    active.0.sweep();
                }
                drop(active);
                tracing::info!("Scope watchdog sweeper stopped");
            });

        match spawned {
            Ok(thread) => {
                tracing::info!(
                    sweep_interval_ms = interval.as_millis(),
                    "Scope watchdog sweeper started"
                );
                Ok(SweeperHandle {
                    signal,
                    thread: Some(thread),
                })
            }
            Err(err) => {
                self.sweeper_active.store(false, Ordering::Release);
                Err(ScopeError::sweeper_spawn_failed(err.to_string()))
            }
        }
    }
}

impl SweeperHandle {
    /// Stop the sweeper and wait for its thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::SweeperPanicked`] if the thread panicked.
    pub fn stop(mut self) -> ScopeResult<()> {
        self.shutdown()
    }

    /// Whether the sweeper thread has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Let the sweeper run for the rest of the process.
    pub(crate) fn detach(mut self) {
        // Dropping the join handle detaches the thread; with `thread` gone
        // `Drop` has nothing to stop.
        drop(self.thread.take());
    }

    fn shutdown(&mut self) -> ScopeResult<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        self.signal.raise();
        thread.join().map_err(|_panic| ScopeError::SweeperPanicked)
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::error!(error = %err, "Scope watchdog sweeper did not stop cleanly");
        }
    }
}
