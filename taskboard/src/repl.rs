//! Interactive command parsing and rendering for the `taskboard` binary.
//!
//! User input is turned into protocol commands with the help of the local
//! [`Board`]: `done`, `undo` and `edit` resend the whole task, so they need
//! the current description or completion flag.

use taskboard_proto::board::Board;
use taskboard_proto::{ClientCommand, ServerEvent, TaskId, TaskRecord};

/// Help text printed by `help`.
pub const HELP: &str = "\
commands:
  add <text>        create a task
  done <id>         mark a task completed
  undo <id>         mark a task not completed
  edit <id> <text>  replace a task's description
  rm <id>           delete a task
  list              show all tasks
  who               show who is online
  help              show this help
  quit              leave the board";

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Send a command to the server.
    Send(ClientCommand),
    /// Print the task list.
    List,
    /// Print online users.
    Who,
    /// Print help.
    Help,
    /// Leave.
    Quit,
}

/// Why a line of user input could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// The first word is not a command.
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),
    /// Right command, wrong arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// The id argument is not a number.
    #[error("not a task id: {0}")]
    InvalidId(String),
    /// The id is not on the local board.
    #[error("no task with id {0}")]
    NoSuchTask(TaskId),
}

/// Parses one line of user input. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns an [`InputError`] describing what is wrong with the line.
pub fn parse_input(line: &str, board: &Board) -> Result<Option<Input>, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word {
        "add" => {
            if rest.is_empty() {
                return Err(InputError::Usage("add <text>"));
            }
            Input::Send(ClientCommand::Add {
                description: rest.to_string(),
            })
        }
        "done" | "undo" => {
            let task = existing_task(rest, board, "done|undo <id>")?;
            Input::Send(ClientCommand::Update {
                id: task.id,
                description: task.description.clone(),
                completed: word == "done",
            })
        }
        "edit" => {
            let (id, text) = rest
                .split_once(char::is_whitespace)
                .ok_or(InputError::Usage("edit <id> <text>"))?;
            let task = existing_task(id, board, "edit <id> <text>")?;
            Input::Send(ClientCommand::Update {
                id: task.id,
                description: text.trim().to_string(),
                completed: task.completed,
            })
        }
        "rm" => {
            let task = existing_task(rest, board, "rm <id>")?;
            Input::Send(ClientCommand::Delete { id: task.id })
        }
        "list" | "ls" => Input::List,
        "who" => Input::Who,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(InputError::Unknown(other.to_string())),
    };
    Ok(Some(input))
}

fn existing_task<'a>(
    arg: &str,
    board: &'a Board,
    usage: &'static str,
) -> Result<&'a TaskRecord, InputError> {
    if arg.is_empty() {
        return Err(InputError::Usage(usage));
    }
    let id: TaskId = arg
        .parse()
        .map_err(|_| InputError::InvalidId(arg.to_string()))?;
    board.get(id).ok_or(InputError::NoSuchTask(id))
}

/// Renders one task as a list row.
#[must_use]
pub fn render_task(task: &TaskRecord) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    format!(
        "[{mark}] {:>3}  {}  ({})",
        task.id, task.description, task.last_modified_by
    )
}

/// Renders the whole board.
#[must_use]
pub fn render_board(board: &Board) -> String {
    if board.is_empty() {
        return "no tasks".to_string();
    }
    board.tasks().map(render_task).collect::<Vec<_>>().join("\n")
}

/// Describes an incoming event against the board as it was before the
/// event is applied. Returns `None` for events not worth printing.
#[must_use]
pub fn describe_event(event: &ServerEvent, board: &Board) -> Option<String> {
    match event {
        ServerEvent::UserJoined { username } => Some(format!("* {username} joined")),
        ServerEvent::UserLeft { username } => Some(format!("* {username} left")),
        ServerEvent::TaskAdded(task) if board.get(task.id).is_none() => {
            Some(format!("+ {}", render_task(task)))
        }
        ServerEvent::TaskUpdated(task) => Some(format!("~ {}", render_task(task))),
        ServerEvent::TaskDeleted { id } => board
            .get(*id)
            .map(|task| format!("- {}", render_task(task))),
        ServerEvent::TaskAdded(_) | ServerEvent::ConnectOk { .. } | ServerEvent::ConnectError { .. } => None,
    }
}
