//! Graded quiz gate.

use std::collections::BTreeSet;
use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use unlock_storage::{KeyValueStore, SharedStore};

use crate::clock::{SharedClock, Timestamp};
use crate::context::GateContext;
use crate::keys;
use crate::task::{Gate, GateProgress};
use crate::Result;

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamOption {
    /// Text reference
    pub label: String,

    /// Whether this answer must be selected
    #[serde(rename = "correct")]
    pub is_correct: bool,
}

impl ExamOption {
    /// Create an option.
    pub fn new(label: impl Into<String>, is_correct: bool) -> Self {
        Self {
            label: label.into(),
            is_correct,
        }
    }

    /// Grade this option: a correct answer must be selected, a wrong one must not.
    pub fn grade(&self, selected: bool) -> bool {
        selected == self.is_correct
    }
}

/// Outcome of an exam submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradeResult {
    /// Every option graded correct; the task is now completed
    Passed,
    /// At least one option graded wrong; answering is locked out
    Failed {
        /// Indices of wrongly graded options
        incorrect: Vec<usize>,
        /// When answering is enabled again
        disabled_until: Timestamp,
    },
    /// Submitted during a lockout; nothing changed
    Locked {
        /// When answering is enabled again
        until: Timestamp,
    },
}

impl GradeResult {
    /// Whether the submission passed.
    pub fn is_passed(&self) -> bool {
        matches!(self, GradeResult::Passed)
    }
}

/// Completed once the question has been answered correctly.
///
/// A wrong submission locks answering out for the configured lockout period.
pub struct ExamTask {
    storage_key: String,
    question: String,
    options: Vec<ExamOption>,
    answered: bool,
    disabled_until: Timestamp,
    lockout: Duration,
    store: SharedStore,
    clock: SharedClock,
}

impl ExamTask {
    /// Create the task, reading the persisted answer and lockout.
    pub fn load(
        storage_key: impl Into<String>,
        question: impl Into<String>,
        ctx: &GateContext,
    ) -> Result<Self> {
        let storage_key = storage_key.into();
        let lockout = ctx.config.exam_lockout()?;
        let answered = ctx.store.get_bool(&keys::exam_answered(&storage_key), false)?;
        let disabled_until = ctx
            .store
            .get_long(&keys::exam_disabled_until(&storage_key), 0)?;

        Ok(Self {
            storage_key,
            question: question.into(),
            options: Vec::new(),
            answered,
            disabled_until,
            lockout,
            store: ctx.store.clone(),
            clock: ctx.clock.clone(),
        })
    }

    /// Append an option.
    pub fn option(mut self, option: ExamOption) -> Self {
        self.options.push(option);
        self
    }

    /// Storage key the state lives under.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Question text reference.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Options in insertion order.
    pub fn options(&self) -> &[ExamOption] {
        &self.options
    }

    /// Whether the question has been answered correctly.
    pub fn is_answered(&self) -> bool {
        self.answered
    }

    /// End of the current lockout (`0` if never locked).
    pub fn disabled_until(&self) -> Timestamp {
        self.disabled_until
    }

    /// Lockout applied after a failed submission.
    pub fn lockout(&self) -> Duration {
        self.lockout
    }

    /// Whether a submission would be graded right now.
    pub fn is_answer_enabled(&self) -> bool {
        self.clock.now() >= self.disabled_until
    }

    /// Grade a submission. `selected` holds the indices of the chosen options.
    ///
    /// Only storage failures are errors; wrong answers and lockouts are
    /// reported through [`GradeResult`].
    pub fn submit(&mut self, selected: impl IntoIterator<Item = usize>) -> Result<GradeResult> {
        let now = self.clock.now();
        if now < self.disabled_until {
            debug!(
                storage_key = %self.storage_key,
                until = self.disabled_until,
                "Submission rejected during lockout"
            );
            return Ok(GradeResult::Locked {
                until: self.disabled_until,
            });
        }

        let selected: BTreeSet<usize> = selected.into_iter().collect();
        if let Some(out_of_range) = selected.iter().find(|&&i| i >= self.options.len()) {
            warn!(
                storage_key = %self.storage_key,
                index = out_of_range,
                "Ignoring selection of unknown option"
            );
        }

        let incorrect: Vec<usize> = self
            .options
            .iter()
            .enumerate()
            .filter(|(index, option)| !option.grade(selected.contains(index)))
            .map(|(index, _)| index)
            .collect();

        if incorrect.is_empty() {
            self.set_answered(true)?;
            info!(storage_key = %self.storage_key, "Exam passed");
            return Ok(GradeResult::Passed);
        }

        let disabled_until = now.saturating_add(self.lockout.num_milliseconds());
        self.set_disabled_until(disabled_until)?;
        info!(
            storage_key = %self.storage_key,
            wrong = incorrect.len(),
            disabled_until,
            "Exam failed"
        );
        Ok(GradeResult::Failed {
            incorrect,
            disabled_until,
        })
    }

    fn set_answered(&mut self, answered: bool) -> Result<()> {
        self.answered = answered;
        self.store
            .put_bool(&keys::exam_answered(&self.storage_key), answered)
    }

    fn set_disabled_until(&mut self, disabled_until: Timestamp) -> Result<()> {
        self.disabled_until = disabled_until;
        self.store
            .put_long(&keys::exam_disabled_until(&self.storage_key), disabled_until)
    }
}

impl Gate for ExamTask {
    fn is_completed(&self, _started_at: Timestamp) -> bool {
        self.answered
    }

    fn progress(&self, _started_at: Timestamp) -> GateProgress {
        if self.answered {
            GateProgress::Completed
        } else if !self.is_answer_enabled() {
            GateProgress::LockedOut {
                until: self.disabled_until,
            }
        } else {
            GateProgress::AwaitingAnswer
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.set_answered(false)?;
        self.set_disabled_until(0)
    }
}

impl fmt::Debug for ExamTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamTask")
            .field("storage_key", &self.storage_key)
            .field("question", &self.question)
            .field("options", &self.options)
            .field("answered", &self.answered)
            .field("disabled_until", &self.disabled_until)
            .finish_non_exhaustive()
    }
}
