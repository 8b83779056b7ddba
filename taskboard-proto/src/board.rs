//! Client-side mirror of the server's board.
//!
//! A [`Board`] is rebuilt purely from the event stream: it never applies a
//! change optimistically. Clients that apply the same stream of events end
//! up with equal boards.

use std::collections::{BTreeMap, BTreeSet};

use crate::event::ServerEvent;
use crate::task::{TaskId, TaskRecord};

/// Local view of tasks and online users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// The username this client joined as.
    local_user: String,
    tasks: BTreeMap<TaskId, TaskRecord>,
    online: BTreeSet<String>,
}

impl Board {
    /// Creates an empty board for the given local user.
    #[must_use]
    pub fn new(local_user: impl Into<String>) -> Self {
        Self {
            local_user: local_user.into(),
            tasks: BTreeMap::new(),
            online: BTreeSet::new(),
        }
    }

    /// Returns the local username.
    #[must_use]
    pub fn local_user(&self) -> &str {
        &self.local_user
    }

    /// Applies one server event.
    ///
    /// `ADD` and `UPDATE` both upsert the full record: the initial sync may
    /// replay a task that was also just broadcast, and the later line always
    /// carries the newer state.
    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::ConnectOk { users } => {
                self.online = users.iter().cloned().collect();
                self.online.insert(self.local_user.clone());
            }
            ServerEvent::ConnectError { .. } => {}
            ServerEvent::UserJoined { username } => {
                self.online.insert(username.clone());
            }
            ServerEvent::UserLeft { username } => {
                self.online.remove(username);
            }
            ServerEvent::TaskAdded(task) | ServerEvent::TaskUpdated(task) => {
                self.tasks.insert(task.id, task.clone());
            }
            ServerEvent::TaskDeleted { id } => {
                self.tasks.remove(id);
            }
        }
    }

    /// Returns a task by id.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&TaskRecord> {
        self.tasks.get(&id)
    }

    /// Returns all tasks ordered by id.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.values()
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if there are no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns online usernames in sorted order, including the local user.
    pub fn online(&self) -> impl Iterator<Item = &str> {
        self.online.iter().map(String::as_str)
    }
}
