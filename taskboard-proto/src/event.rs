//! Server-to-client events.
//!
//! `ADD` and `UPDATE` events share a layout:
//! `<WORD>:<id>:<description>:<completed>:<last_modified_by>`. The same
//! `ADD` line is used both for a freshly created task and for each task
//! replayed during the initial sync after `CONNECT_OK`.

use crate::codec::{self, FIELD_SEPARATOR, ParseError, USER_LIST_SEPARATOR};
use crate::task::{TaskId, TaskRecord};

/// Event words sent by the server.
pub mod words {
    /// `CONNECT_OK:<user>,<user>,...`
    pub const CONNECT_OK: &str = "CONNECT_OK";
    /// `CONNECT_ERROR:<reason>`
    pub const CONNECT_ERROR: &str = "CONNECT_ERROR";
    /// `USER_JOINED:<username>`
    pub const USER_JOINED: &str = "USER_JOINED";
    /// `USER_LEFT:<username>`
    pub const USER_LEFT: &str = "USER_LEFT";
    /// `ADD:<id>:<description>:<completed>:<last_modified_by>`
    pub const ADD: &str = "ADD";
    /// `UPDATE:<id>:<description>:<completed>:<last_modified_by>`
    pub const UPDATE: &str = "UPDATE";
    /// `DELETE:<id>`
    pub const DELETE: &str = "DELETE";
}

/// An event pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// The username claim succeeded. Carries the other online users.
    ConnectOk {
        /// Usernames of the other active sessions.
        users: Vec<String>,
    },
    /// The username claim failed. The session stays unauthenticated.
    ConnectError {
        /// Human-readable reason.
        reason: String,
    },
    /// Another user joined the board.
    UserJoined {
        /// The user who joined.
        username: String,
    },
    /// A user left the board.
    UserLeft {
        /// The user who left.
        username: String,
    },
    /// A task was created, or is being replayed during the initial sync.
    TaskAdded(TaskRecord),
    /// A task was replaced in full.
    TaskUpdated(TaskRecord),
    /// A task was removed.
    TaskDeleted {
        /// Id of the removed task.
        id: TaskId,
    },
}

/// Encodes an event as a single line, without the trailing newline.
#[must_use]
pub fn encode(event: &ServerEvent) -> String {
    match event {
        ServerEvent::ConnectOk { users } => {
            let sep = USER_LIST_SEPARATOR.to_string();
            format!("{}:{}", words::CONNECT_OK, users.join(&sep))
        }
        ServerEvent::ConnectError { reason } => format!("{}:{reason}", words::CONNECT_ERROR),
        ServerEvent::UserJoined { username } => format!("{}:{username}", words::USER_JOINED),
        ServerEvent::UserLeft { username } => format!("{}:{username}", words::USER_LEFT),
        ServerEvent::TaskAdded(task) => encode_task(words::ADD, task),
        ServerEvent::TaskUpdated(task) => encode_task(words::UPDATE, task),
        ServerEvent::TaskDeleted { id } => format!("{}:{id}", words::DELETE),
    }
}

fn encode_task(word: &str, task: &TaskRecord) -> String {
    format!(
        "{word}:{}:{}:{}:{}",
        task.id, task.description, task.completed, task.last_modified_by
    )
}

/// Decodes an event line received from the server.
///
/// # Errors
///
/// Returns a [`ParseError`] if the line is not a well-formed event.
pub fn decode(line: &str) -> Result<ServerEvent, ParseError> {
    if line.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let (word, payload) = codec::split_command(line);
    match word {
        words::CONNECT_OK => {
            let users = match payload {
                None | Some("") => Vec::new(),
                Some(list) => list
                    .split(USER_LIST_SEPARATOR)
                    .map(str::to_string)
                    .collect(),
            };
            Ok(ServerEvent::ConnectOk { users })
        }
        words::CONNECT_ERROR => Ok(ServerEvent::ConnectError {
            reason: payload.unwrap_or_default().to_string(),
        }),
        words::USER_JOINED => Ok(ServerEvent::UserJoined {
            username: payload
                .ok_or(ParseError::MissingField("username"))?
                .to_string(),
        }),
        words::USER_LEFT => Ok(ServerEvent::UserLeft {
            username: payload
                .ok_or(ParseError::MissingField("username"))?
                .to_string(),
        }),
        words::ADD => decode_task(payload).map(ServerEvent::TaskAdded),
        words::UPDATE => decode_task(payload).map(ServerEvent::TaskUpdated),
        words::DELETE => {
            let payload = payload.ok_or(ParseError::MissingField("id"))?;
            Ok(ServerEvent::TaskDeleted {
                id: codec::parse_id(payload)?,
            })
        }
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

/// Decodes `<id>:<description>:<completed>:<last_modified_by>`.
///
/// The id ends at the first colon; the author starts after the last colon
/// and the completion flag sits between the last two colons.
fn decode_task(payload: Option<&str>) -> Result<TaskRecord, ParseError> {
    let payload = payload.ok_or(ParseError::MissingField("id"))?;
    let (id, rest) = payload
        .split_once(FIELD_SEPARATOR)
        .ok_or(ParseError::MissingField("description"))?;
    let id = codec::parse_id(id)?;
    let (head, author) = rest
        .rsplit_once(FIELD_SEPARATOR)
        .ok_or(ParseError::MissingField("last_modified_by"))?;
    let (description, completed) = head
        .rsplit_once(FIELD_SEPARATOR)
        .ok_or(ParseError::MissingField("completed"))?;
    Ok(TaskRecord::new(
        id,
        description,
        codec::parse_bool(completed),
        author,
    ))
}
