//! Field splitting shared by the command and event decoders.
//!
//! A line is `WORD[:payload]`. Payloads that carry a task id, a description
//! and trailing fields are split on the *first* colon after the id and the
//! *last* colon(s) before the trailing fields, so a description may itself
//! contain colons. The rule is ambiguous for descriptions that end in
//! something shaped like the trailing fields; that ambiguity is part of the
//! wire contract and is kept as-is.

use crate::task::TaskId;

/// Separator between fields of a line.
pub const FIELD_SEPARATOR: char = ':';

/// Separator between usernames in a `CONNECT_OK` list.
pub const USER_LIST_SEPARATOR: char = ',';

/// Error type for decoding a protocol line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line was empty or whitespace only.
    #[error("empty line")]
    Empty,
    /// The leading word is not part of the vocabulary for this direction.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// A required field was absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),
    /// A task id field was not a non-negative integer.
    #[error("invalid task id: {0:?}")]
    InvalidId(String),
    /// An `ADD` carried no description text.
    #[error("empty task description")]
    EmptyDescription,
}

/// Splits a line into its command word and the remaining payload.
///
/// The payload is everything after the first colon, or `None` when the
/// line has no colon at all.
#[must_use]
pub fn split_command(line: &str) -> (&str, Option<&str>) {
    match line.split_once(FIELD_SEPARATOR) {
        Some((word, payload)) => (word, Some(payload)),
        None => (line, None),
    }
}

/// Parses a task id field, ignoring surrounding whitespace.
///
/// # Errors
///
/// Returns [`ParseError::InvalidId`] if the field is not a `u64`.
pub fn parse_id(field: &str) -> Result<TaskId, ParseError> {
    field
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidId(field.to_string()))
}

/// Parses a boolean field.
///
/// Only `true` (in any ASCII case) is true; every other value is false.
#[must_use]
pub fn parse_bool(field: &str) -> bool {
    field.eq_ignore_ascii_case("true")
}

/// Splits `<id>:<description>:<tail>` on the first and last colon.
///
/// Returns the parsed id, the description and the tail. Fails if there is
/// no colon after the id, or if the first and last colon coincide.
///
/// # Errors
///
/// Returns [`ParseError::MissingField`] or [`ParseError::InvalidId`].
pub fn split_id_description_tail(payload: &str) -> Result<(TaskId, &str, &str), ParseError> {
    let first = payload
        .find(FIELD_SEPARATOR)
        .ok_or(ParseError::MissingField("description"))?;
    let id = parse_id(&payload[..first])?;
    let last = payload
        .rfind(FIELD_SEPARATOR)
        .ok_or(ParseError::MissingField("completed"))?;
    if last == first {
        return Err(ParseError::MissingField("completed"));
    }
    Ok((id, &payload[first + 1..last], &payload[last + 1..]))
}
