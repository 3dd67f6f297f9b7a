//! Identifiers for tracked tasks.

use serde::{Deserialize, Serialize};

/// Numeric identifier of a tracked task (rendered as the `T123` monogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Create a TaskId from its numeric value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric value of this id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    /// Accepts both `T123` and `123`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches(['T', 't']);
        Ok(Self(digits.parse()?))
    }
}
