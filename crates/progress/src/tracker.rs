//! Sequential objective tracking.

use std::fmt;

use serde::Serialize;
use tracing::info;
use unlock_core::{
    Gate, GateContext, Objective, ObjectiveDefinition, SharedClock, Timestamp,
};

use crate::error::{ProgressError, Result};

/// Where an objective stands in the progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    /// An earlier objective is not accomplished
    Locked,
    /// Can be started
    Available,
    /// Started, tasks still pending
    InProgress,
    /// Started and every task completed
    ReadyToAccomplish,
    /// Accomplished
    Accomplished,
}

impl ObjectiveStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveStatus::Locked => "locked",
            ObjectiveStatus::Available => "available",
            ObjectiveStatus::InProgress => "in progress",
            ObjectiveStatus::ReadyToAccomplish => "ready",
            ObjectiveStatus::Accomplished => "accomplished",
        }
    }
}

impl fmt::Display for ObjectiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one task at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskProgress {
    /// Task title
    pub title: String,
    /// Variant name
    pub kind: &'static str,
    /// Whether the task counts as completed
    pub completed: bool,
    /// Human-readable progress
    pub progress: String,
}

/// Progress of one objective at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectiveProgress {
    /// Objective key
    pub key: String,
    /// Objective title
    pub title: String,
    /// Status
    pub status: ObjectiveStatus,
    /// Start timestamp (0 = never)
    pub started_at: Timestamp,
    /// Accomplishment timestamp (0 = never)
    pub accomplished_at: Timestamp,
    /// Per-task progress
    pub tasks: Vec<TaskProgress>,
}

/// A snapshot of progress at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// When snapshot was taken
    pub timestamp: Timestamp,
    /// Index of the current objective, if any is left
    pub current: Option<usize>,
    /// Objectives in order
    pub objectives: Vec<ObjectiveProgress>,
}

/// Ordered objectives, walked strictly one after another.
///
/// An objective can only be started once every earlier objective is
/// accomplished, and only accomplished once all of its tasks are completed.
pub struct ObjectiveTracker {
    objectives: Vec<Objective>,
    clock: SharedClock,
}

impl ObjectiveTracker {
    /// Create a tracker over `objectives` (in progression order).
    pub fn new(objectives: Vec<Objective>, ctx: &GateContext) -> Self {
        Self {
            objectives,
            clock: ctx.clock.clone(),
        }
    }

    /// Build every definition and track the result.
    pub fn from_definitions(definitions: &[ObjectiveDefinition], ctx: &GateContext) -> Result<Self> {
        let objectives = ObjectiveDefinition::build_all(definitions, ctx)?;
        Ok(Self::new(objectives, ctx))
    }

    /// All objectives in order.
    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Objective at `index`.
    pub fn get(&self, index: usize) -> Option<&Objective> {
        self.objectives.get(index)
    }

    /// Objective at `index`, mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Objective> {
        self.objectives.get_mut(index)
    }

    /// Position of the objective with `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.objectives.iter().position(|o| o.key() == key)
    }

    /// Position of the objective with `key`, or an error naming it.
    pub fn index_of(&self, key: &str) -> Result<usize> {
        self.position(key)
            .ok_or_else(|| ProgressError::UnknownObjective(key.to_string()))
    }

    /// First objective that is not accomplished.
    pub fn current_index(&self) -> Option<usize> {
        self.objectives.iter().position(|o| !o.is_accomplished())
    }

    /// Whether every objective before `index` is accomplished.
    pub fn all_prior_accomplished(&self, index: usize) -> bool {
        self.first_unaccomplished_before(index).is_none()
    }

    fn first_unaccomplished_before(&self, index: usize) -> Option<&Objective> {
        self.objectives
            .iter()
            .take(index)
            .find(|o| !o.is_accomplished())
    }

    /// Whether the objective with `key` is accomplished; unknown keys are not.
    pub fn is_unlocked(&self, key: &str) -> bool {
        self.position(key)
            .map(|i| self.objectives[i].is_accomplished())
            .unwrap_or(false)
    }

    /// Status of the objective at `index`.
    pub fn status(&self, index: usize) -> Result<ObjectiveStatus> {
        let objective = self.objective(index)?;
        let status = if objective.is_accomplished() {
            ObjectiveStatus::Accomplished
        } else if !self.all_prior_accomplished(index) {
            ObjectiveStatus::Locked
        } else if !objective.is_started() {
            ObjectiveStatus::Available
        } else if objective.is_completed() {
            ObjectiveStatus::ReadyToAccomplish
        } else {
            ObjectiveStatus::InProgress
        };
        Ok(status)
    }

    /// Start the objective at `index` now.
    pub fn start(&mut self, index: usize) -> Result<Timestamp> {
        let objective = self.objective(index)?;
        if objective.is_started() {
            return Err(ProgressError::AlreadyStarted(objective.key().to_string()));
        }
        if let Some(blocking) = self.first_unaccomplished_before(index) {
            return Err(ProgressError::PriorNotAccomplished {
                key: objective.key().to_string(),
                blocking: blocking.key().to_string(),
            });
        }

        let now = self.clock.now();
        let objective = self.objective_mut(index)?;
        objective.set_started(now)?;
        info!(objective = %objective.key(), started_at = now, "Objective started");
        Ok(now)
    }

    /// Accomplish the objective at `index`.
    ///
    /// With a `trusted_time` (e.g. from a network time source) completion is
    /// evaluated at that time and recorded with it; otherwise the local clock
    /// is used.
    pub fn accomplish(&mut self, index: usize, trusted_time: Option<Timestamp>) -> Result<Timestamp> {
        let objective = self.objective(index)?;
        if objective.is_accomplished() {
            return Err(ProgressError::AlreadyAccomplished(objective.key().to_string()));
        }
        if !objective.is_started() {
            return Err(ProgressError::NotStarted(objective.key().to_string()));
        }

        let at = trusted_time.unwrap_or_else(|| self.clock.now());
        let completed = match trusted_time {
            Some(time) => objective.is_completed_at(time),
            None => objective.is_completed(),
        };
        if !completed {
            let started_at = objective.started_at();
            let pending = objective
                .tasks()
                .iter()
                .filter(|task| !task.is_completed_at(started_at, at))
                .count();
            return Err(ProgressError::TasksIncomplete {
                key: objective.key().to_string(),
                pending,
            });
        }

        let objective = self.objective_mut(index)?;
        objective.set_accomplished(at)?;
        info!(objective = %objective.key(), accomplished_at = at, "Objective accomplished");
        Ok(at)
    }

    /// Undo a start. Accomplished objectives cannot be un-started.
    pub fn revert_start(&mut self, index: usize) -> Result<()> {
        let objective = self.objective_mut(index)?;
        if objective.is_accomplished() {
            return Err(ProgressError::AlreadyAccomplished(objective.key().to_string()));
        }
        if !objective.is_started() {
            return Err(ProgressError::NotStarted(objective.key().to_string()));
        }
        objective.set_started(0)?;
        info!(objective = %objective.key(), "Objective start reverted");
        Ok(())
    }

    /// Undo an accomplishment. The objective stays started.
    pub fn revert_accomplish(&mut self, index: usize) -> Result<()> {
        let objective = self.objective_mut(index)?;
        if !objective.is_accomplished() {
            return Err(ProgressError::NotAccomplished(objective.key().to_string()));
        }
        objective.set_accomplished(0)?;
        info!(objective = %objective.key(), "Objective accomplishment reverted");
        Ok(())
    }

    /// Reset every objective and its tasks.
    pub fn reset(&mut self) -> Result<()> {
        for objective in &mut self.objectives {
            objective.reset()?;
        }
        info!(count = self.objectives.len(), "All objectives reset");
        Ok(())
    }

    /// Take a progress snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let objectives = self
            .objectives
            .iter()
            .enumerate()
            .map(|(index, objective)| ObjectiveProgress {
                key: objective.key().to_string(),
                title: objective.title().to_string(),
                status: self.status(index).unwrap_or(ObjectiveStatus::Locked),
                started_at: objective.started_at(),
                accomplished_at: objective.accomplished_at(),
                tasks: objective
                    .tasks()
                    .iter()
                    .map(|task| {
                        let progress = task.progress(objective.started_at());
                        TaskProgress {
                            title: task.title().to_string(),
                            kind: task.kind().name(),
                            completed: progress.is_done(),
                            progress: progress.to_string(),
                        }
                    })
                    .collect(),
            })
            .collect();

        ProgressSnapshot {
            timestamp: self.clock.now(),
            current: self.current_index(),
            objectives,
        }
    }

    fn objective(&self, index: usize) -> Result<&Objective> {
        self.objectives
            .get(index)
            .ok_or_else(|| ProgressError::UnknownObjective(format!("#{}", index)))
    }

    fn objective_mut(&mut self, index: usize) -> Result<&mut Objective> {
        self.objectives
            .get_mut(index)
            .ok_or_else(|| ProgressError::UnknownObjective(format!("#{}", index)))
    }
}
