//! Registry of active sessions and broadcast fan-out.
//!
//! Each active session registers the sender half of its outbound channel.
//! A broadcast encodes the event once, snapshots the registered senders and
//! pushes the line to each. A recipient whose channel is already closed is
//! skipped; it never stops delivery to the others and never surfaces as an
//! error to the caller.

use std::fmt;

use taskboard_proto::ServerEvent;
use taskboard_proto::event;
use tokio::sync::mpsc;

use crate::sync::{AtomicCounter, Registry};

/// Identifier of one accepted connection. Never sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
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

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sender half of a session's outbound line channel.
pub type Outbound = mpsc::UnboundedSender<String>;

/// Active sessions keyed by id, plus the connection id counter.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Registry<SessionId, Outbound>,
    ids: AtomicCounter,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an id for a newly accepted connection.
    ///
    /// Independent of the task id counter.
    pub fn next_id(&self) -> SessionId {
        SessionId::new(self.ids.next())
    }

    /// Registers a session so that it receives broadcasts.
    pub fn register(&self, id: SessionId, outbound: Outbound) {
        if self.sessions.put(id, outbound).is_some() {
            tracing::warn!(session_id = %id, "session registered twice, replacing sender");
        }
    }

    /// Removes a session. Returns `true` if it was registered.
    pub fn unregister(&self, id: SessionId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Returns `true` if the session is registered.
    #[must_use]
    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Returns the number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sends an event to every registered session.
    ///
    /// Returns how many sessions accepted the line.
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        self.fan_out(event, None)
    }

    /// Sends an event to every registered session except `skip`.
    pub fn broadcast_except(&self, event: &ServerEvent, skip: SessionId) -> usize {
        self.fan_out(event, Some(skip))
    }

    fn fan_out(&self, event: &ServerEvent, skip: Option<SessionId>) -> usize {
        let line = event::encode(event);
        let recipients: Vec<(SessionId, Outbound)> = self.sessions.read(|sessions| {
            sessions
                .iter()
                .filter(|(id, _)| Some(**id) != skip)
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        });

        tracing::debug!(line = %line, recipients = recipients.len(), "broadcasting");

        let mut delivered = 0;
        for (id, tx) in recipients {
            if tx.send(line.clone()).is_ok() {
                delivered += 1;
            } else {
                // The session is closing; its own cleanup unregisters it.
                tracing::debug!(session_id = %id, "recipient channel closed, skipping");
            }
        }
        delivered
    }
}
