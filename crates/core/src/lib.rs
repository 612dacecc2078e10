//! Unlock core models.
//!
//! Objectives, the tasks that gate them, and the clock and storage seams they
//! are evaluated against. An objective is completed when every one of its tasks
//! reports completion; persisted state survives restarts through the injected
//! key-value store.

#![warn(missing_docs)]

// Time and wiring
mod clock;
mod config;
mod context;
pub mod keys;

// Value objects
mod content;

// Tasks
mod task;
mod duration;
mod confirmation;
mod exam;

// Objectives
mod objective;
mod definition;

// Re-exports
pub use clock::{format_timestamp, Clock, ManualClock, SharedClock, SystemClock, Timestamp};
pub use config::{GatingMode, UnlockConfig};
pub use context::GateContext;

pub use content::{Hint, LearningNote};

pub use task::{format_duration, Gate, GateProgress, Task, TaskKind};
pub use duration::MinimumDurationTask;
pub use confirmation::{Acknowledgement, ConfirmationAction, ConfirmationTask};
pub use exam::{ExamOption, ExamTask, GradeResult};

pub use objective::Objective;
pub use definition::{ObjectiveDefinition, TaskDefinition, TaskKindDefinition};

/// Storage result type used throughout this crate.
pub use unlock_storage::{Result, StorageError};
