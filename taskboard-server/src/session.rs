//! Per-connection protocol state machine.
//!
//! A [`Session`] starts [`Phase::Unauthenticated`], becomes
//! [`Phase::Active`] once it claims a username, and ends in
//! [`Phase::Closed`]. It turns decoded lines into store operations and
//! publishes the resulting events. It never touches the socket: replies go
//! into its outbound channel, which the connection's writer task drains.
//!
//! Malformed lines and operations on unknown task ids are logged and
//! dropped. Nothing a client sends can close its own connection or affect
//! another session.

use std::sync::Arc;

use taskboard_proto::command::{self, ClientCommand};
use taskboard_proto::event;
use taskboard_proto::{ParseError, ServerEvent, TaskId};

use crate::sessions::{Outbound, SessionId};
use crate::state::BoardState;

/// Lifecycle phase of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Connected, no username yet. Only `CONNECT` is accepted.
    Unauthenticated,
    /// Holding a username and receiving broadcasts.
    Active {
        /// The claimed username.
        username: String,
    },
    /// Terminal. Every further line is ignored.
    Closed,
}

/// Server-side state of one connected client.
pub struct Session {
    id: SessionId,
    state: Arc<BoardState>,
    outbound: Outbound,
    phase: Phase,
}

impl Session {
    /// Creates an unauthenticated session writing to `outbound`.
    #[must_use]
    pub const fn new(id: SessionId, state: Arc<BoardState>, outbound: Outbound) -> Self {
        Self {
            id,
            state,
            outbound,
            phase: Phase::Unauthenticated,
        }
    }

    /// Returns this session's id.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Returns the claimed username while active.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match &self.phase {
            Phase::Active { username } => Some(username),
            Phase::Unauthenticated | Phase::Closed => None,
        }
    }

    /// Handles one inbound line.
    pub fn handle_line(&mut self, line: &str) {
        let username = match &self.phase {
            Phase::Closed => {
                tracing::debug!(session_id = %self.id, "line after close ignored");
                return;
            }
            Phase::Unauthenticated => None,
            Phase::Active { username } => Some(username.clone()),
        };

        tracing::debug!(session_id = %self.id, line = %line, "received");

        let cmd = match command::decode(line) {
            Ok(cmd) => cmd,
            Err(ParseError::Empty) => return,
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, line = %line, "dropping malformed line");
                return;
            }
        };

        match (username, cmd) {
            (None, ClientCommand::Connect { username }) => self.connect(username),
            (None, other) => {
                tracing::debug!(session_id = %self.id, cmd = ?other, "ignoring command before connect");
            }
            (Some(username), ClientCommand::Connect { .. }) => {
                tracing::warn!(session_id = %self.id, username = %username, "already connected, ignoring CONNECT");
            }
            (Some(username), ClientCommand::Add { description }) => {
                self.add(&username, &description);
            }
            (Some(username), ClientCommand::Update {
                id,
                description,
                completed,
            }) => self.update(&username, id, &description, completed),
            (Some(username), ClientCommand::Delete { id }) => self.delete(&username, id),
        }
    }

    /// Closes the session, releasing its username and announcing departure.
    ///
    /// Idempotent. Also runs on drop.
    pub fn close(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::Active { username } => {
                let sessions = &self.state.sessions;
                let id = self.id;
                let released = self.state.users.release_with(&username, || {
                    sessions.unregister(id);
                    sessions.broadcast(&ServerEvent::UserLeft {
                        username: username.clone(),
                    });
                });
                if !released {
                    sessions.unregister(id);
                }
                tracing::info!(session_id = %id, username = %username, "user disconnected");
            }
            Phase::Unauthenticated => {
                self.state.sessions.unregister(self.id);
                tracing::debug!(session_id = %self.id, "closed before connect");
            }
            Phase::Closed => {}
        }
    }

    /// Sends an event to this session only.
    fn reply(&self, event: &ServerEvent) {
        send_event(self.id, &self.outbound, event);
    }

    /// Claims `username`; on success acknowledges, announces the join and
    /// replays every stored task to this session only.
    fn connect(&mut self, username: String) {
        let id = self.id;
        let outbound = &self.outbound;
        let sessions = &self.state.sessions;

        let claimed = self.state.users.claim_with(&username, id, |others| {
            // Acknowledge before registering, so CONNECT_OK is always the
            // first line this client reads after claiming.
            send_event(id, outbound, &ServerEvent::ConnectOk { users: others });
            sessions.register(id, outbound.clone());
            sessions.broadcast_except(
                &ServerEvent::UserJoined {
                    username: username.clone(),
                },
                id,
            );
        });

        match claimed {
            Ok(()) => {
                tracing::info!(session_id = %id, username = %username, "user connected");
                self.phase = Phase::Active { username };
                self.sync_tasks();
            }
            Err(e) => {
                tracing::info!(session_id = %id, username = %username, reason = %e, "connect rejected");
                self.reply(&ServerEvent::ConnectError {
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Replays the current task list as `ADD` lines, ordered by id.
    fn sync_tasks(&self) {
        let mut count = 0_usize;
        self.state.tasks.for_each_task(|task| {
            self.reply(&ServerEvent::TaskAdded(task.to_record()));
            count += 1;
        });
        tracing::info!(session_id = %self.id, count, "sent existing tasks");
    }

    fn add(&self, username: &str, description: &str) {
        let sessions = &self.state.sessions;
        let task = self.state.tasks.add_task_with(description, username, |task| {
            sessions.broadcast(&ServerEvent::TaskAdded(task.to_record()));
        });
        tracing::info!(session_id = %self.id, username = %username, task_id = %task.id, "task added");
    }

    fn update(&self, username: &str, id: TaskId, description: &str, completed: bool) {
        let sessions = &self.state.sessions;
        let updated = self
            .state
            .tasks
            .update_task_with(id, description, completed, username, |task| {
                sessions.broadcast(&ServerEvent::TaskUpdated(task.to_record()));
            });
        if updated {
            tracing::info!(session_id = %self.id, username = %username, task_id = %id, "task updated");
        } else {
            tracing::info!(session_id = %self.id, username = %username, task_id = %id, "update for unknown task ignored");
        }
    }

    fn delete(&self, username: &str, id: TaskId) {
        let sessions = &self.state.sessions;
        let deleted = self.state.tasks.delete_task_with(id, |task| {
            sessions.broadcast(&ServerEvent::TaskDeleted { id: task.id });
        });
        if deleted {
            tracing::info!(session_id = %self.id, username = %username, task_id = %id, "task deleted");
        } else {
            tracing::info!(session_id = %self.id, username = %username, task_id = %id, "delete for unknown task ignored");
        }
    }
}

/// Queues one event on a session's outbound channel. A closed channel means
/// the writer has already gone, so the event is dropped.
fn send_event(id: SessionId, outbound: &Outbound, event: &ServerEvent) {
    if outbound.send(event::encode(event)).is_err() {
        tracing::debug!(session_id = %id, "outbound closed, event dropped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
