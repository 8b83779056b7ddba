//! Process-wide shared state.
//!
//! One [`BoardState`] is built at startup and handed to every connection
//! as an `Arc`. Nothing is persisted; all of it lives until the process
//! exits.

use crate::sessions::SessionRegistry;
use crate::tasks::TaskStore;
use crate::users::UserDirectory;

/// Default maximum length of one protocol line in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024;

/// Shared board state: tasks, active usernames and active sessions.
///
/// Write sections nest only as users then sessions (join and leave) or
/// tasks then sessions (mutation broadcast). Users and tasks never nest.
#[derive(Debug)]
pub struct BoardState {
    /// The authoritative task list.
    pub tasks: TaskStore,
    /// Active usernames.
    pub users: UserDirectory,
    /// Active sessions, for broadcast.
    pub sessions: SessionRegistry,
    /// Maximum accepted line length in bytes.
    max_line_length: usize,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    /// Creates empty state with the default line limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Creates empty state with a custom line limit.
    #[must_use]
    pub fn with_config(max_line_length: usize) -> Self {
        Self {
            tasks: TaskStore::new(),
            users: UserDirectory::new(),
            sessions: SessionRegistry::new(),
            max_line_length,
        }
    }

    /// Returns the maximum accepted line length in bytes.
    #[must_use]
    pub const fn max_line_length(&self) -> usize {
        self.max_line_length
    }
}
