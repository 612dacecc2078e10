//! Objective model - a gated milestone composed of ordered tasks.

use std::fmt;

use chrono::Duration;
use tracing::{debug, warn};
use unlock_storage::{KeyValueStore, SharedStore};

use crate::clock::{SharedClock, Timestamp};
use crate::config::GatingMode;
use crate::context::GateContext;
use crate::keys;
use crate::task::{Gate, Task};
use crate::Result;

/// A milestone that is completed once every task is.
///
/// `started_at` and `accomplished_at` are written through to the store on
/// every change. Setting `accomplished_at` is the caller's decision; the
/// objective only derives completion from its tasks.
pub struct Objective {
    key: String,
    title: String,
    gate: String,
    started_at: Timestamp,
    accomplished_at: Timestamp,
    tasks: Vec<Task>,
    mode: GatingMode,
    store: SharedStore,
    clock: SharedClock,
}

impl Objective {
    /// Create an objective, reading its persisted timestamps.
    ///
    /// Timestamps further in the future than the configured tamper tolerance
    /// indicate a clock that was moved back after progress was recorded; both
    /// are reset to `0`.
    pub fn load(
        key: impl Into<String>,
        title: impl Into<String>,
        gate: impl Into<String>,
        ctx: &GateContext,
    ) -> Result<Self> {
        let key = key.into();
        let started_at = ctx.store.get_long(&keys::objective_started(&key), 0)?;
        let accomplished_at = ctx.store.get_long(&keys::objective_accomplished(&key), 0)?;

        let mut objective = Self {
            key,
            title: title.into(),
            gate: gate.into(),
            started_at,
            accomplished_at,
            tasks: Vec::new(),
            mode: ctx.config.gating_mode(),
            store: ctx.store.clone(),
            clock: ctx.clock.clone(),
        };
        objective.guard_against_tampering(ctx.config.tamper_tolerance()?)?;
        Ok(objective)
    }

    fn guard_against_tampering(&mut self, tolerance: Duration) -> Result<()> {
        let now = self.clock.now();
        let tolerance = tolerance.num_milliseconds();
        let ahead = |ts: Timestamp| ts.saturating_sub(now) > tolerance;

        if ahead(self.started_at) || ahead(self.accomplished_at) {
            warn!(
                objective = %self.key,
                started_at = self.started_at,
                accomplished_at = self.accomplished_at,
                now,
                "Persisted progress is ahead of the clock, resetting objective"
            );
            self.set_started(0)?;
            self.set_accomplished(0)?;
        }
        Ok(())
    }

    /// Override the gating mode.
    pub fn with_mode(mut self, mode: GatingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Append a task.
    pub fn task(&mut self, task: Task) -> &mut Self {
        self.tasks.push(task);
        self
    }

    /// Append a task, builder style.
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Stable identifier.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Title text reference.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Text reference describing what this objective unlocks.
    pub fn gate(&self) -> &str {
        &self.gate
    }

    /// Gating mode.
    pub fn mode(&self) -> GatingMode {
        self.mode
    }

    /// Start timestamp (`0` if never started).
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Accomplishment timestamp (`0` if never accomplished).
    pub fn accomplished_at(&self) -> Timestamp {
        self.accomplished_at
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Mutable access to one task, for host interaction.
    pub fn task_mut(&mut self, index: usize) -> Option<&mut Task> {
        self.tasks.get_mut(index)
    }

    /// Set and persist the start timestamp.
    pub fn set_started(&mut self, started_at: Timestamp) -> Result<()> {
        self.started_at = started_at;
        self.store
            .put_long(&keys::objective_started(&self.key), started_at)?;
        debug!(objective = %self.key, started_at, "Persisted start");
        Ok(())
    }

    /// Set and persist the accomplishment timestamp.
    pub fn set_accomplished(&mut self, accomplished_at: Timestamp) -> Result<()> {
        self.accomplished_at = accomplished_at;
        self.store
            .put_long(&keys::objective_accomplished(&self.key), accomplished_at)?;
        debug!(objective = %self.key, accomplished_at, "Persisted accomplishment");
        Ok(())
    }

    /// Whether the objective has been started.
    pub fn is_started(&self) -> bool {
        self.started_at != 0
    }

    /// Whether the objective has been accomplished.
    pub fn is_accomplished(&self) -> bool {
        self.accomplished_at != 0
    }

    /// Whether every task is completed now. An objective without tasks is.
    pub fn is_completed(&self) -> bool {
        self.mode == GatingMode::Bypass
            || self.tasks.iter().all(|task| task.is_completed(self.started_at))
    }

    /// Whether every task would be completed at `at`.
    pub fn is_completed_at(&self, at: Timestamp) -> bool {
        self.mode == GatingMode::Bypass
            || self
                .tasks
                .iter()
                .all(|task| task.is_completed_at(self.started_at, at))
    }

    /// Clear both timestamps and every task's persisted state.
    pub fn reset(&mut self) -> Result<()> {
        self.set_started(0)?;
        self.set_accomplished(0)?;
        for task in &mut self.tasks {
            task.reset()?;
        }
        Ok(())
    }
}

impl fmt::Debug for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Objective")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("gate", &self.gate)
            .field("started_at", &self.started_at)
            .field("accomplished_at", &self.accomplished_at)
            .field("tasks", &self.tasks)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfirmationTask, ExamOption, ExamTask, ManualClock, MinimumDurationTask, UnlockConfig};
    use std::sync::Arc;
    use unlock_storage::{KeyValueStore, MemoryStore};

    const T0: Timestamp = 1_700_000_000_000;
    const HOUR: i64 = 60 * 60 * 1000;

    fn setup() -> (Arc<ManualClock>, GateContext) {
        let clock = Arc::new(ManualClock::new(T0));
        let ctx = GateContext::from_shared(Arc::new(MemoryStore::new()), clock.clone());
        (clock, ctx)
    }

    fn confirmation(ctx: &GateContext, key: &str) -> Task {
        Task::new(key, ConfirmationTask::load(key, ctx).unwrap())
    }

    #[test]
    fn test_fresh_objective_is_not_started() {
        let (_clock, ctx) = setup();
        let objective = Objective::load("usage", "Use the app", "Unlocks nothing", &ctx).unwrap();

        assert_eq!(objective.key(), "usage");
        assert!(!objective.is_started());
        assert!(!objective.is_accomplished());
    }

    #[test]
    fn test_empty_objective_is_completed() {
        let (_clock, ctx) = setup();
        let objective = Objective::load("empty", "", "", &ctx).unwrap();
        assert!(objective.is_completed());
        assert!(objective.is_completed_at(0));
    }

    #[test]
    fn test_setters_write_through() {
        let (_clock, ctx) = setup();
        let mut objective = Objective::load("usage", "", "", &ctx).unwrap();
        objective.set_started(T0).unwrap();
        objective.set_accomplished(T0 + HOUR).unwrap();

        assert_eq!(ctx.store.get_long("Objectives_usage_started", 0).unwrap(), T0);
        assert_eq!(
            ctx.store.get_long("Objectives_usage_accomplished", 0).unwrap(),
            T0 + HOUR
        );

        let reloaded = Objective::load("usage", "", "", &ctx).unwrap();
        assert_eq!(reloaded.started_at(), T0);
        assert_eq!(reloaded.accomplished_at(), T0 + HOUR);
    }

    #[test]
    fn test_completion_is_and_over_tasks() {
        let (_clock, ctx) = setup();
        let mut objective = Objective::load("ack", "", "", &ctx)
            .unwrap()
            .with_task(confirmation(&ctx, "first"))
            .with_task(confirmation(&ctx, "second"));

        assert!(!objective.is_completed());

        objective.task_mut(1).unwrap().as_confirmation_mut().unwrap().record_answer(true).unwrap();
        assert!(!objective.is_completed());

        objective.task_mut(0).unwrap().as_confirmation_mut().unwrap().record_answer(true).unwrap();
        assert!(objective.is_completed());
    }

    #[test]
    fn test_tamper_guard_resets_future_start() {
        let (_clock, ctx) = setup();
        ctx.store.put_long("Objectives_usage_started", T0 + 3 * HOUR + 1).unwrap();
        ctx.store.put_long("Objectives_usage_accomplished", T0).unwrap();

        let objective = Objective::load("usage", "", "", &ctx).unwrap();
        assert_eq!(objective.started_at(), 0);
        assert_eq!(objective.accomplished_at(), 0);
        assert_eq!(ctx.store.get_long("Objectives_usage_started", -1).unwrap(), 0);
        assert_eq!(ctx.store.get_long("Objectives_usage_accomplished", -1).unwrap(), 0);
    }

    #[test]
    fn test_tamper_guard_resets_future_accomplishment() {
        let (_clock, ctx) = setup();
        ctx.store.put_long("Objectives_usage_started", T0 - HOUR).unwrap();
        ctx.store.put_long("Objectives_usage_accomplished", T0 + 4 * HOUR).unwrap();

        let objective = Objective::load("usage", "", "", &ctx).unwrap();
        assert_eq!(objective.started_at(), 0);
        assert_eq!(objective.accomplished_at(), 0);
    }

    #[test]
    fn test_tamper_guard_tolerates_small_skew() {
        let (_clock, ctx) = setup();
        ctx.store.put_long("Objectives_usage_started", T0 + 3 * HOUR).unwrap();

        let objective = Objective::load("usage", "", "", &ctx).unwrap();
        assert_eq!(objective.started_at(), T0 + 3 * HOUR);
    }

    #[test]
    fn test_tamper_guard_after_clock_moves_back() {
        let (clock, ctx) = setup();
        let mut objective = Objective::load("usage", "", "", &ctx).unwrap();
        objective.set_started(T0).unwrap();

        clock.set(T0 - 24 * HOUR);
        let reloaded = Objective::load("usage", "", "", &ctx).unwrap();
        assert!(!reloaded.is_started());
    }

    #[test]
    fn test_negative_tolerance_keeps_past_progress() {
        let (_clock, ctx) = setup();
        let ctx = ctx.with_config(UnlockConfig {
            tamper_tolerance_minutes: -60,
            ..Default::default()
        });
        ctx.store.put_long("Objectives_usage_started", T0 - 1000).unwrap();

        assert!(Objective::load("usage", "", "", &ctx).is_err());
        assert_eq!(ctx.store.get_long("Objectives_usage_started", 0).unwrap(), T0 - 1000);
    }

    #[test]
    fn test_duration_projection() {
        let (_clock, ctx) = setup();
        let mut objective = Objective::load("wait", "", "", &ctx).unwrap().with_task(Task::new(
            "Wait two hours",
            MinimumDurationTask::new(chrono::Duration::hours(2), &ctx),
        ));
        objective.set_started(T0).unwrap();

        assert!(!objective.is_completed());
        assert!(!objective.is_completed_at(T0 + HOUR));
        assert!(objective.is_completed_at(T0 + 2 * HOUR));
    }

    #[test]
    fn test_bypass_mode_reports_completed() {
        let (_clock, ctx) = setup();
        let ctx = ctx.with_config(UnlockConfig {
            bypass_gates: true,
            ..Default::default()
        });
        let objective = Objective::load("usage", "", "", &ctx)
            .unwrap()
            .with_task(confirmation(&ctx, "ack"));

        assert_eq!(objective.mode(), GatingMode::Bypass);
        assert!(objective.is_completed());
        assert!(objective.is_completed_at(0));

        let enforced = objective.with_mode(GatingMode::Enforced);
        assert!(!enforced.is_completed());
    }

    #[test]
    fn test_reset_clears_everything() {
        let (_clock, ctx) = setup();
        let mut objective = Objective::load("quiz", "", "", &ctx).unwrap();
        objective.task(confirmation(&ctx, "ack")).task(Task::new(
            "Quiz",
            ExamTask::load("q", "?", &ctx).unwrap().option(ExamOption::new("yes", true)),
        ));
        objective.set_started(T0).unwrap();
        objective.set_accomplished(T0).unwrap();
        objective.task_mut(0).unwrap().as_confirmation_mut().unwrap().record_answer(true).unwrap();
        objective.task_mut(1).unwrap().as_exam_mut().unwrap().submit([0]).unwrap();
        assert!(objective.is_completed());

        objective.reset().unwrap();
        assert!(!objective.is_started());
        assert!(!objective.is_accomplished());
        assert!(!objective.is_completed());
        assert!(!ctx.store.get_bool("ExamTask_q", true).unwrap());
    }
}
