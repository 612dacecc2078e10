//! Informational payloads attached to tasks.

use serde::{Deserialize, Serialize};

/// A hint shown next to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    /// Text reference
    pub text: String,

    /// Whether URLs in the text should be rendered as links
    #[serde(default = "default_autolink")]
    pub autolink: bool,
}

fn default_autolink() -> bool {
    true
}

impl Hint {
    /// Create a hint with URL auto-linking enabled.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            autolink: true,
        }
    }

    /// Render the text without link detection.
    pub fn plain(mut self) -> Self {
        self.autolink = false;
        self
    }
}

/// Something the user learns by completing a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearningNote {
    /// Text reference
    pub text: String,
}

impl LearningNote {
    /// Create a learning note.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
