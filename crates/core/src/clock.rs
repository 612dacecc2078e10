//! Clock port for obtaining the current time.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

/// Epoch milliseconds. `0` means "never".
pub type Timestamp = i64;

/// Render a timestamp as a UTC date and time, falling back to the raw
/// milliseconds when it is out of range.
pub fn format_timestamp(timestamp: Timestamp) -> String {
    Utc.timestamp_millis_opt(timestamp)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Provides the current wall-clock time.
///
/// Injected into objectives and tasks so hosts and tests control what "now" is.
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now(&self) -> Timestamp;
}

/// Shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Jump to an absolute time (backwards jumps allowed).
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
