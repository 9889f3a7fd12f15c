//! Property status model.

use serde::{Deserialize, Serialize};

/// Change status of a primary key or of a (key, mutation) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropertyStatus {
    /// Not in the snapshot baseline.
    New,
    /// Differs from the snapshot baseline.
    Changed,
    /// Same as the snapshot baseline.
    Unchanged,
    /// Absent from the mutation file.
    Missing,
}

impl PropertyStatus {
    /// Get the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Changed => "CHANGED",
            Self::Unchanged => "UNCHANGED",
            Self::Missing => "MISSING",
        }
    }

    /// Status of `current` against the `baseline` value.
    #[must_use]
    pub fn compare(baseline: Option<&str>, current: &str) -> Self {
        match baseline {
            None => Self::New,
            Some(old) if old == current => Self::Unchanged,
            Some(_) => Self::Changed,
        }
    }

    /// Whether a translator needs to see the key.
    #[must_use]
    pub const fn needs_translation(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl std::fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
