//! Storage key conventions.
//!
//! Every persisted field lives under a key derived from the owning objective's
//! key or the task's storage key.

/// Key of an objective's start timestamp.
pub fn objective_started(objective_key: &str) -> String {
    format!("Objectives_{}_started", objective_key)
}

/// Key of an objective's accomplishment timestamp.
pub fn objective_accomplished(objective_key: &str) -> String {
    format!("Objectives_{}_accomplished", objective_key)
}

/// Key of a confirmation task's answered flag.
pub fn confirmation_answered(storage_key: &str) -> String {
    format!("ConfirmationTask_{}", storage_key)
}

/// Key of an exam task's answered flag.
pub fn exam_answered(storage_key: &str) -> String {
    format!("ExamTask_{}", storage_key)
}

/// Key of an exam task's lockout timestamp.
pub fn exam_disabled_until(storage_key: &str) -> String {
    format!("DisabledTo_{}", storage_key)
}
