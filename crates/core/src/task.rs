//! Task model - one gating rule within an objective.

use std::fmt;

use chrono::Duration;

use crate::clock::{format_timestamp, Timestamp};
use crate::confirmation::ConfirmationTask;
use crate::content::{Hint, LearningNote};
use crate::duration::MinimumDurationTask;
use crate::exam::ExamTask;
use crate::Result;

/// Capabilities every task variant provides.
///
/// `started_at` is the owning objective's start timestamp (`0` when the
/// objective was never started). Evaluation is total: "not yet" is `false`,
/// never an error.
pub trait Gate {
    /// Whether the rule is satisfied now.
    fn is_completed(&self, started_at: Timestamp) -> bool;

    /// Whether the rule would be satisfied at `at`.
    ///
    /// Variants that do not depend on time fall back to [`Gate::is_completed`].
    fn is_completed_at(&self, started_at: Timestamp, at: Timestamp) -> bool {
        let _ = at;
        self.is_completed(started_at)
    }

    /// Describe how far along the rule is.
    fn progress(&self, started_at: Timestamp) -> GateProgress;

    /// Whether the rule should be skipped entirely.
    fn should_be_ignored(&self) -> bool {
        false
    }

    /// Clear persisted state.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Progress of a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateProgress {
    /// Rule satisfied
    Completed,
    /// Task is skipped
    Ignored,
    /// Waiting for time to pass
    Waiting {
        /// Time elapsed since the objective started
        elapsed: Duration,
        /// Time required
        required: Duration,
    },
    /// Waiting for the user to confirm
    AwaitingConfirmation,
    /// Waiting for a correct exam submission
    AwaitingAnswer,
    /// Exam answers are locked out
    LockedOut {
        /// When answering is enabled again
        until: Timestamp,
    },
}

impl GateProgress {
    /// Whether this progress counts towards completion.
    pub fn is_done(&self) -> bool {
        matches!(self, GateProgress::Completed | GateProgress::Ignored)
    }
}

impl fmt::Display for GateProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateProgress::Completed => write!(f, "completed"),
            GateProgress::Ignored => write!(f, "ignored"),
            GateProgress::Waiting { elapsed, required } => write!(
                f,
                "{} of {} elapsed",
                format_duration(*elapsed),
                format_duration(*required)
            ),
            GateProgress::AwaitingConfirmation => write!(f, "awaiting confirmation"),
            GateProgress::AwaitingAnswer => write!(f, "awaiting answer"),
            GateProgress::LockedOut { until } => {
                write!(f, "locked until {}", format_timestamp(*until))
            }
        }
    }
}

/// Format a duration as days, hours and minutes, e.g. `1d 4h` or `45m`.
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{}m", minutes));
    }
    parts.join(" ")
}

/// The task variants.
pub enum TaskKind {
    /// Time-elapsed gate
    MinimumDuration(MinimumDurationTask),
    /// User acknowledgement gate
    Confirmation(ConfirmationTask),
    /// Graded quiz gate
    Exam(ExamTask),
}

impl TaskKind {
    /// Variant name.
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::MinimumDuration(_) => "minimum_duration",
            TaskKind::Confirmation(_) => "confirmation",
            TaskKind::Exam(_) => "exam",
        }
    }

    fn gate(&self) -> &dyn Gate {
        match self {
            TaskKind::MinimumDuration(task) => task,
            TaskKind::Confirmation(task) => task,
            TaskKind::Exam(task) => task,
        }
    }

    fn gate_mut(&mut self) -> &mut dyn Gate {
        match self {
            TaskKind::MinimumDuration(task) => task,
            TaskKind::Confirmation(task) => task,
            TaskKind::Exam(task) => task,
        }
    }
}

impl fmt::Debug for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::MinimumDuration(task) => f.debug_tuple("MinimumDuration").field(task).finish(),
            TaskKind::Confirmation(task) => f.debug_tuple("Confirmation").field(task).finish(),
            TaskKind::Exam(task) => f.debug_tuple("Exam").field(task).finish(),
        }
    }
}

impl From<MinimumDurationTask> for TaskKind {
    fn from(task: MinimumDurationTask) -> Self {
        TaskKind::MinimumDuration(task)
    }
}

impl From<ConfirmationTask> for TaskKind {
    fn from(task: ConfirmationTask) -> Self {
        TaskKind::Confirmation(task)
    }
}

impl From<ExamTask> for TaskKind {
    fn from(task: ExamTask) -> Self {
        TaskKind::Exam(task)
    }
}

/// A task: common presentation data plus the gating rule.
#[derive(Debug)]
pub struct Task {
    title: String,
    hints: Vec<Hint>,
    learning_notes: Vec<LearningNote>,
    ignored: bool,
    kind: TaskKind,
}

impl Task {
    /// Create a task.
    pub fn new(title: impl Into<String>, kind: impl Into<TaskKind>) -> Self {
        Self {
            title: title.into(),
            hints: Vec::new(),
            learning_notes: Vec::new(),
            ignored: false,
            kind: kind.into(),
        }
    }

    /// Append a hint.
    pub fn hint(mut self, hint: Hint) -> Self {
        self.hints.push(hint);
        self
    }

    /// Append a learning note.
    pub fn learned(mut self, note: LearningNote) -> Self {
        self.learning_notes.push(note);
        self
    }

    /// Mark the task as skipped (it then evaluates as completed).
    pub fn ignored(mut self, ignored: bool) -> Self {
        self.ignored = ignored;
        self
    }

    /// Task title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Hints in insertion order.
    pub fn hints(&self) -> &[Hint] {
        &self.hints
    }

    /// Learning notes in insertion order.
    pub fn learning_notes(&self) -> &[LearningNote] {
        &self.learning_notes
    }

    /// The gating rule.
    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    /// The gating rule, mutably.
    pub fn kind_mut(&mut self) -> &mut TaskKind {
        &mut self.kind
    }

    /// The confirmation rule, if this is a confirmation task.
    pub fn as_confirmation_mut(&mut self) -> Option<&mut ConfirmationTask> {
        match &mut self.kind {
            TaskKind::Confirmation(task) => Some(task),
            _ => None,
        }
    }

    /// The exam rule, if this is an exam task.
    pub fn as_exam_mut(&mut self) -> Option<&mut ExamTask> {
        match &mut self.kind {
            TaskKind::Exam(task) => Some(task),
            _ => None,
        }
    }
}

impl Gate for Task {
    fn is_completed(&self, started_at: Timestamp) -> bool {
        self.should_be_ignored() || self.kind.gate().is_completed(started_at)
    }

    fn is_completed_at(&self, started_at: Timestamp, at: Timestamp) -> bool {
        self.should_be_ignored() || self.kind.gate().is_completed_at(started_at, at)
    }

    fn progress(&self, started_at: Timestamp) -> GateProgress {
        if self.should_be_ignored() {
            GateProgress::Ignored
        } else {
            self.kind.gate().progress(started_at)
        }
    }

    fn should_be_ignored(&self) -> bool {
        self.ignored || self.kind.gate().should_be_ignored()
    }

    fn reset(&mut self) -> Result<()> {
        self.kind.gate_mut().reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GateContext, ManualClock};
    use unlock_storage::MemoryStore;

    fn context() -> GateContext {
        GateContext::new(MemoryStore::new(), ManualClock::new(1_000_000))
    }

    #[test]
    fn test_builder_keeps_insertion_order() {
        let ctx = context();
        let task = Task::new(
            "Acknowledge",
            ConfirmationTask::load("ack", &ctx).unwrap(),
        )
        .hint(Hint::new("first"))
        .hint(Hint::new("second").plain())
        .learned(LearningNote::new("a"))
        .learned(LearningNote::new("b"));

        assert_eq!(task.title(), "Acknowledge");
        let hints: Vec<_> = task.hints().iter().map(|h| h.text.as_str()).collect();
        assert_eq!(hints, vec!["first", "second"]);
        assert!(task.hints()[0].autolink);
        assert!(!task.hints()[1].autolink);
        assert_eq!(task.learning_notes().len(), 2);
        assert_eq!(task.kind().name(), "confirmation");
    }

    #[test]
    fn test_ignored_task_counts_as_completed() {
        let ctx = context();
        let task = Task::new("Skip me", ConfirmationTask::load("skip", &ctx).unwrap()).ignored(true);

        assert!(task.should_be_ignored());
        assert!(task.is_completed(0));
        assert!(task.is_completed_at(0, 0));
        assert_eq!(task.progress(0), GateProgress::Ignored);
    }

    #[test]
    fn test_variant_accessors() {
        let ctx = context();
        let mut task = Task::new("Quiz", ExamTask::load("q1", "Pick", &ctx).unwrap());

        assert!(task.as_exam_mut().is_some());
        assert!(task.as_confirmation_mut().is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::zero()), "0m");
        assert_eq!(format_duration(Duration::minutes(45)), "45m");
        assert_eq!(format_duration(Duration::hours(2)), "2h");
        assert_eq!(format_duration(Duration::hours(28) + Duration::minutes(5)), "1d 4h 5m");
        assert_eq!(format_duration(Duration::minutes(-5)), "0m");
    }

    #[test]
    fn test_progress_display() {
        let waiting = GateProgress::Waiting {
            elapsed: Duration::hours(1),
            required: Duration::days(1),
        };
        assert_eq!(waiting.to_string(), "1h of 1d elapsed");
        assert!(!waiting.is_done());
        assert!(GateProgress::Completed.is_done());

        let locked = GateProgress::LockedOut {
            until: 1_700_000_000_000,
        };
        assert_eq!(locked.to_string(), "locked until 2023-11-14 22:13:20 UTC");
    }
}
