//! Progress tracking errors.

use unlock_storage::StorageError;

/// Result type for tracker transitions.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Reasons a tracker transition is refused.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// No objective with this key or index
    #[error("Unknown objective: {0}")]
    UnknownObjective(String),

    /// An earlier objective is not accomplished yet
    #[error("Objective {key} is locked until {blocking} is accomplished")]
    PriorNotAccomplished {
        /// Requested objective
        key: String,
        /// First earlier objective that is not accomplished
        blocking: String,
    },

    /// Objective already started
    #[error("Objective {0} is already started")]
    AlreadyStarted(String),

    /// Objective not started
    #[error("Objective {0} is not started")]
    NotStarted(String),

    /// Objective already accomplished
    #[error("Objective {0} is already accomplished")]
    AlreadyAccomplished(String),

    /// Objective not accomplished
    #[error("Objective {0} is not accomplished")]
    NotAccomplished(String),

    /// Some tasks are not completed
    #[error("Objective {key} has {pending} incomplete task(s)")]
    TasksIncomplete {
        /// Objective key
        key: String,
        /// Number of incomplete tasks
        pending: usize,
    },

    /// Storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
