//! Gating configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{Result, StorageError};

/// How strictly objectives evaluate their tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatingMode {
    /// Tasks decide completion.
    #[default]
    Enforced,
    /// Every completion predicate reports true. Debug/override use only.
    Bypass,
}

/// Configuration shared by every objective and task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockConfig {
    /// Cooldown after a failed exam submission
    pub exam_lockout_minutes: i64,

    /// How far ahead of the clock a persisted timestamp may be before the
    /// objective is considered tampered with
    pub tamper_tolerance_minutes: i64,

    /// Skip all gating
    pub bypass_gates: bool,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            exam_lockout_minutes: 60,
            tamper_tolerance_minutes: 3 * 60,
            bypass_gates: false,
        }
    }
}

impl UnlockConfig {
    /// Check every field, e.g. after reading the config from a file.
    pub fn validate(&self) -> Result<()> {
        self.exam_lockout()?;
        self.tamper_tolerance()?;
        Ok(())
    }

    /// Exam lockout as a duration.
    pub fn exam_lockout(&self) -> Result<Duration> {
        non_negative_minutes("exam_lockout_minutes", self.exam_lockout_minutes)
    }

    /// Tamper tolerance as a duration.
    pub fn tamper_tolerance(&self) -> Result<Duration> {
        non_negative_minutes("tamper_tolerance_minutes", self.tamper_tolerance_minutes)
    }

    /// Gating mode objectives are built with.
    pub fn gating_mode(&self) -> GatingMode {
        if self.bypass_gates {
            GatingMode::Bypass
        } else {
            GatingMode::Enforced
        }
    }
}

fn non_negative_minutes(field: &str, minutes: i64) -> Result<Duration> {
    if minutes < 0 {
        return Err(StorageError::Other(format!(
            "{} must not be negative, got {}",
            field, minutes
        )));
    }
    Duration::try_minutes(minutes)
        .ok_or_else(|| StorageError::Other(format!("{} out of range: {}", field, minutes)))
}
