//! Client-to-server commands.

use crate::codec::{self, ParseError};
use crate::task::TaskId;

/// Command words understood by the server.
pub mod words {
    /// `CONNECT:<username>`
    pub const CONNECT: &str = "CONNECT";
    /// `ADD:<description>`
    pub const ADD: &str = "ADD";
    /// `UPDATE:<id>:<description>:<completed>`
    pub const UPDATE: &str = "UPDATE";
    /// `DELETE:<id>`
    pub const DELETE: &str = "DELETE";
}

/// A command sent by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Claim a username and join the board. Only valid before joining.
    Connect {
        /// Requested username, already trimmed.
        username: String,
    },
    /// Create a task. The server assigns the id.
    Add {
        /// Task description, verbatim.
        description: String,
    },
    /// Replace the mutable fields of an existing task.
    Update {
        /// Task to replace.
        id: TaskId,
        /// New description.
        description: String,
        /// New completion flag.
        completed: bool,
    },
    /// Remove a task.
    Delete {
        /// Task to remove.
        id: TaskId,
    },
}

/// Encodes a command as a single line, without the trailing newline.
#[must_use]
pub fn encode(cmd: &ClientCommand) -> String {
    match cmd {
        ClientCommand::Connect { username } => format!("{}:{username}", words::CONNECT),
        ClientCommand::Add { description } => format!("{}:{description}", words::ADD),
        ClientCommand::Update {
            id,
            description,
            completed,
        } => format!("{}:{id}:{description}:{completed}", words::UPDATE),
        ClientCommand::Delete { id } => format!("{}:{id}", words::DELETE),
    }
}

/// Decodes a command line received from a client.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first problem found. Callers
/// treat every error as "drop this line", never as fatal.
pub fn decode(line: &str) -> Result<ClientCommand, ParseError> {
    if line.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let (word, payload) = codec::split_command(line);
    match word {
        words::CONNECT => {
            let username = payload.ok_or(ParseError::MissingField("username"))?;
            Ok(ClientCommand::Connect {
                username: username.trim().to_string(),
            })
        }
        words::ADD => {
            let description = payload.ok_or(ParseError::MissingField("description"))?;
            if description.trim().is_empty() {
                return Err(ParseError::EmptyDescription);
            }
            Ok(ClientCommand::Add {
                description: description.to_string(),
            })
        }
        words::UPDATE => {
            let payload = payload.ok_or(ParseError::MissingField("id"))?;
            let (id, description, completed) = codec::split_id_description_tail(payload)?;
            Ok(ClientCommand::Update {
                id,
                description: description.to_string(),
                completed: codec::parse_bool(completed),
            })
        }
        words::DELETE => {
            let payload = payload.ok_or(ParseError::MissingField("id"))?;
            Ok(ClientCommand::Delete {
                id: codec::parse_id(payload)?,
            })
        }
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}
