//! Time-elapsed gate.

use std::fmt;

use chrono::Duration;

use crate::clock::{SharedClock, Timestamp};
use crate::context::GateContext;
use crate::task::{Gate, GateProgress};

/// Completed once `minimum_duration` has passed since the objective started.
///
/// Has no persisted state of its own; it reads the owning objective's start
/// timestamp. An objective that was never started never satisfies it.
pub struct MinimumDurationTask {
    minimum_duration: Duration,
    clock: SharedClock,
}

impl MinimumDurationTask {
    /// Create the task.
    pub fn new(minimum_duration: Duration, ctx: &GateContext) -> Self {
        Self {
            minimum_duration,
            clock: ctx.clock.clone(),
        }
    }

    /// Required elapsed time.
    pub fn minimum_duration(&self) -> Duration {
        self.minimum_duration
    }

    /// Time elapsed between `started_at` and `at`, clamped at zero.
    pub fn elapsed(&self, started_at: Timestamp, at: Timestamp) -> Duration {
        if started_at == 0 {
            return Duration::zero();
        }
        Duration::milliseconds(at.saturating_sub(started_at).max(0))
    }
}

impl Gate for MinimumDurationTask {
    fn is_completed(&self, started_at: Timestamp) -> bool {
        self.is_completed_at(started_at, self.clock.now())
    }

    fn is_completed_at(&self, started_at: Timestamp, at: Timestamp) -> bool {
        started_at != 0
            && at.saturating_sub(started_at) >= self.minimum_duration.num_milliseconds()
    }

    fn progress(&self, started_at: Timestamp) -> GateProgress {
        let now = self.clock.now();
        if self.is_completed_at(started_at, now) {
            GateProgress::Completed
        } else {
            GateProgress::Waiting {
                elapsed: self.elapsed(started_at, now),
                required: self.minimum_duration,
            }
        }
    }
}

impl fmt::Debug for MinimumDurationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinimumDurationTask")
            .field("minimum_duration", &self.minimum_duration)
            .finish_non_exhaustive()
    }
}
