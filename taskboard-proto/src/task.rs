//! Task identity and the wire view of a task.

use std::fmt;
use std::str::FromStr;

/// Server-assigned task identifier.
///
/// Ids are handed out once from a monotonically increasing counter and
/// never reused, so ordering by id is ordering by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Wraps a raw counter value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A task as it travels on the wire.
///
/// This is the subset of the server's task that clients see: the
/// modification timestamp stays server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// Unique task identifier.
    pub id: TaskId,
    /// Free-form description. May contain `:`, never a newline.
    pub description: String,
    /// Whether the task is done.
    pub completed: bool,
    /// Username of the session that last created or replaced the task.
    pub last_modified_by: String,
}

impl TaskRecord {
    /// Creates a record from its parts.
    #[must_use]
    pub fn new(
        id: TaskId,
        description: impl Into<String>,
        completed: bool,
        last_modified_by: impl Into<String>,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            completed,
            last_modified_by: last_modified_by.into(),
        }
    }
}
