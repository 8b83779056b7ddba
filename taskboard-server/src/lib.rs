//! Taskboard server library.
//!
//! Holds the authoritative task list and the set of active users, accepts
//! line-protocol clients over TCP and keeps every client's copy of the
//! board in step by broadcasting each accepted change to all of them.
//!
//! Exposed as a library for integration tests and embedding; the
//! `taskboard-server` binary is a thin wrapper around [`server::start_server`].

pub mod config;
pub mod server;
pub mod session;
pub mod sessions;
pub mod state;
pub mod sync;
pub mod tasks;
pub mod users;
