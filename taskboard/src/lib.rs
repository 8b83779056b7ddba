//! Taskboard client library.
//!
//! [`client::Client`] speaks the line protocol to a `taskboard-server`;
//! [`repl`] turns typed commands into protocol commands and renders the
//! board for the `taskboard` binary.

pub mod client;
pub mod config;
pub mod repl;

pub use client::{Client, ClientError};
