//! Cooperative shutdown coordination.
//!
//! `ShutdownSignal` is a write-once stop flag owned by the run controller and
//! handed to the executor by reference. The interrupt handler only sets it; the
//! executor polls it at batch boundaries and never inside a batch.
//!
//! Notes:
//! - Relaxed atomics are sufficient for a one-way "stop" flag.
//! - `request()` is safe to call from a signal-handling thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Anything the executor can poll for a stop request.
pub trait CancelSource {
    fn is_cancelled(&self) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cooperative shutdown (idempotent, never cleared).
    #[inline]
    pub fn request(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Route SIGINT/SIGTERM (Ctrl+C on Windows) to this signal.
    /// `on_signal` runs on the handler thread after the flag is set.
    pub fn install_handler<F>(&self, on_signal: F) -> Result<(), ctrlc::Error>
    where
        F: Fn() + Send + 'static,
    {
        let signal = self.clone();
        ctrlc::set_handler(move || {
            signal.request();
            on_signal();
        })
    }
}

impl CancelSource for ShutdownSignal {
    fn is_cancelled(&self) -> bool {
        self.is_requested()
    }
}

/// A source that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelSource for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}
