//! Declarative objective definitions.
//!
//! Hosts usually describe their objectives statically. Definitions are plain
//! serde data so they can live in a JSON file; building one loads the persisted
//! state of the objective and all of its tasks.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::confirmation::ConfirmationTask;
use crate::content::{Hint, LearningNote};
use crate::context::GateContext;
use crate::duration::MinimumDurationTask;
use crate::exam::{ExamOption, ExamTask};
use crate::objective::Objective;
use crate::task::{Task, TaskKind};
use crate::{Result, StorageError};

/// Static description of an objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveDefinition {
    /// Stable identifier
    pub key: String,

    /// Title text reference
    pub title: String,

    /// What the objective unlocks
    #[serde(default)]
    pub gate: String,

    /// Tasks in evaluation order
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

/// Static description of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Title text reference
    pub title: String,

    /// Hints
    #[serde(default)]
    pub hints: Vec<Hint>,

    /// Learning notes
    #[serde(default)]
    pub learned: Vec<LearningNote>,

    /// Skip this task
    #[serde(default)]
    pub ignored: bool,

    /// Gating rule
    #[serde(flatten)]
    pub kind: TaskKindDefinition,
}

/// Gating rule of a task definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskKindDefinition {
    /// Time since the objective started
    MinimumDuration {
        /// Days
        #[serde(default)]
        days: i64,
        /// Hours
        #[serde(default)]
        hours: i64,
        /// Minutes
        #[serde(default)]
        minutes: i64,
    },

    /// User acknowledgement
    Confirmation {
        /// Storage key of the answer
        storage_key: String,
    },

    /// Graded quiz
    Exam {
        /// Storage key of the answer and lockout
        storage_key: String,
        /// Question text reference
        question: String,
        /// Options in display order
        options: Vec<ExamOption>,
    },
}

impl TaskKindDefinition {
    /// Required duration of a `minimum_duration` rule, `None` for other rules.
    ///
    /// Fails when the total does not fit a [`Duration`].
    pub fn duration(&self) -> Result<Option<Duration>> {
        let TaskKindDefinition::MinimumDuration { days, hours, minutes } = self else {
            return Ok(None);
        };

        Duration::try_days(*days)
            .zip(Duration::try_hours(*hours))
            .zip(Duration::try_minutes(*minutes))
            .and_then(|((d, h), m)| d.checked_add(&h)?.checked_add(&m))
            .map(Some)
            .ok_or_else(|| {
                StorageError::Other(format!(
                    "Minimum duration out of range: {}d {}h {}m",
                    days, hours, minutes
                ))
            })
    }

    fn build(&self, ctx: &GateContext) -> Result<TaskKind> {
        let kind: TaskKind = match self {
            TaskKindDefinition::MinimumDuration { .. } => {
                let duration = self.duration()?.unwrap_or_else(Duration::zero);
                MinimumDurationTask::new(duration, ctx).into()
            }
            TaskKindDefinition::Confirmation { storage_key } => {
                ConfirmationTask::load(storage_key.as_str(), ctx)?.into()
            }
            TaskKindDefinition::Exam {
                storage_key,
                question,
                options,
            } => options
                .iter()
                .cloned()
                .fold(ExamTask::load(storage_key.as_str(), question.as_str(), ctx)?, ExamTask::option)
                .into(),
        };
        Ok(kind)
    }
}

impl TaskDefinition {
    /// Build the task, loading its persisted state.
    pub fn build(&self, ctx: &GateContext) -> Result<Task> {
        let mut task = Task::new(self.title.as_str(), self.kind.build(ctx)?).ignored(self.ignored);
        for hint in &self.hints {
            task = task.hint(hint.clone());
        }
        for note in &self.learned {
            task = task.learned(note.clone());
        }
        Ok(task)
    }
}

impl ObjectiveDefinition {
    /// Parse a JSON array of definitions.
    pub fn from_json(json: &str) -> serde_json::Result<Vec<Self>> {
        serde_json::from_str(json)
    }

    /// Build the objective with all of its tasks.
    pub fn build(&self, ctx: &GateContext) -> Result<Objective> {
        let mut objective =
            Objective::load(self.key.as_str(), self.title.as_str(), self.gate.as_str(), ctx)?;
        for task in &self.tasks {
            objective.task(task.build(ctx)?);
        }
        Ok(objective)
    }

    /// Build every definition, preserving order.
    pub fn build_all(definitions: &[Self], ctx: &GateContext) -> Result<Vec<Objective>> {
        definitions.iter().map(|definition| definition.build(ctx)).collect()
    }
}
