//! Progress Tracking
//!
//! Sequential objective progression: which objective is current, the rules
//! for starting and accomplishing objectives, and progress snapshots.

#![warn(missing_docs)]

pub mod error;
pub mod tracker;

pub use error::{ProgressError, Result};
pub use tracker::{
    ObjectiveProgress, ObjectiveStatus, ObjectiveTracker, ProgressSnapshot, TaskProgress,
};
