//! The authoritative task list.
//!
//! [`TaskStore`] owns every [`Task`]; callers only ever receive clones.
//! Mutations replace all mutable fields of a task in one write section, so
//! no reader can observe a half-applied update. Concurrent updates to the
//! same task resolve last-writer-wins in the order the server applies them.
//!
//! Each mutating operation has a `_with` variant taking an `on_commit`
//! hook. The hook runs inside the write section, right after the change is
//! applied, which lets the caller publish the change in exactly the order
//! changes were committed.

use std::time::{SystemTime, UNIX_EPOCH};

use taskboard_proto::{TaskId, TaskRecord};

use crate::sync::{AtomicCounter, Registry};

/// A task as the server stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Immutable, unique id.
    pub id: TaskId,
    /// Free-form description.
    pub description: String,
    /// Completion flag.
    pub completed: bool,
    /// Username of the last writer.
    pub last_modified_by: String,
    /// Milliseconds since epoch of the last write.
    pub last_modified_at: u64,
}

impl Task {
    /// Returns the wire view of this task.
    #[must_use]
    pub fn to_record(&self) -> TaskRecord {
        TaskRecord::new(
            self.id,
            self.description.clone(),
            self.completed,
            self.last_modified_by.clone(),
        )
    }

    /// Replaces every mutable field at once.
    fn replace(&mut self, description: &str, completed: bool, author: &str) {
        description.clone_into(&mut self.description);
        self.completed = completed;
        author.clone_into(&mut self.last_modified_by);
        self.last_modified_at = now_ms();
    }
}

/// Returns the current timestamp in milliseconds since epoch.
fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(u64::MAX)
}

/// Shared task table plus its id counter.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Registry<TaskId, Task>,
    ids: AtomicCounter,
}

impl TaskStore {
    /// Creates an empty store whose first task gets id 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a task with `completed = false` and returns a copy of it.
    pub fn add_task(&self, description: &str, author: &str) -> Task {
        self.add_task_with(description, author, |_| {})
    }

    /// Like [`add_task`](Self::add_task), running `on_commit` inside the
    /// write section after the insert.
    pub fn add_task_with(
        &self,
        description: &str,
        author: &str,
        on_commit: impl FnOnce(&Task),
    ) -> Task {
        let task = Task {
            id: TaskId::new(self.ids.next()),
            description: description.to_string(),
            completed: false,
            last_modified_by: author.to_string(),
            last_modified_at: now_ms(),
        };
        self.tasks.write(|tasks| {
            tasks.insert(task.id, task.clone());
            on_commit(&task);
        });
        tracing::debug!(task_id = %task.id, author = %author, "task added");
        task
    }

    /// Returns a copy of one task.
    #[must_use]
    pub fn get_task(&self, id: TaskId) -> Option<Task> {
        self.tasks.get(&id)
    }

    /// Returns a snapshot of every task, ordered by id.
    #[must_use]
    pub fn list_all(&self) -> Vec<Task> {
        self.tasks.values_snapshot()
    }

    /// Visits every task, ordered by id, while holding off all writers.
    ///
    /// Used for the initial sync: anything `f` sends is guaranteed to reach
    /// the channel before any change committed after this snapshot.
    pub fn for_each_task(&self, f: impl FnMut(&Task)) {
        self.tasks.read(|tasks| tasks.values().for_each(f));
    }

    /// Returns the number of stored tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if no tasks are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Replaces description, completion, author and timestamp of a task.
    ///
    /// Returns `false`, changing nothing, if the task does not exist.
    pub fn update_task(
        &self,
        id: TaskId,
        description: &str,
        completed: bool,
        author: &str,
    ) -> bool {
        self.update_task_with(id, description, completed, author, |_| {})
    }

    /// Like [`update_task`](Self::update_task), running `on_commit` with the
    /// new value inside the write section.
    pub fn update_task_with(
        &self,
        id: TaskId,
        description: &str,
        completed: bool,
        author: &str,
        on_commit: impl FnOnce(&Task),
    ) -> bool {
        let updated = self.tasks.write(|tasks| {
            let Some(task) = tasks.get_mut(&id) else {
                return false;
            };
            task.replace(description, completed, author);
            on_commit(task);
            true
        });
        if updated {
            tracing::debug!(task_id = %id, author = %author, completed, "task updated");
        }
        updated
    }

    /// Removes a task. Returns whether a task was actually removed.
    pub fn delete_task(&self, id: TaskId) -> bool {
        self.delete_task_with(id, |_| {})
    }

    /// Like [`delete_task`](Self::delete_task), running `on_commit` with the
    /// removed value inside the write section.
    pub fn delete_task_with(&self, id: TaskId, on_commit: impl FnOnce(&Task)) -> bool {
        let deleted = self.tasks.write(|tasks| {
            let Some(task) = tasks.remove(&id) else {
                return false;
            };
            on_commit(&task);
            true
        });
        if deleted {
            tracing::debug!(task_id = %id, "task deleted");
        }
        deleted
    }
}
