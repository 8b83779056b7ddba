//! Shared protocol definitions for the task board wire format.
//!
//! Every message is one UTF-8 text line of `:`-delimited fields. Commands
//! flow client to server ([`command::ClientCommand`]), events flow server to
//! client ([`event::ServerEvent`]).

pub mod board;
pub mod codec;
pub mod command;
pub mod event;
pub mod task;

pub use codec::ParseError;
pub use command::ClientCommand;
pub use event::ServerEvent;
pub use task::{TaskId, TaskRecord};
