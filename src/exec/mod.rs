// src/exec/mod.rs

//! Process launching layer.
//!
//! This module is responsible for actually starting the engine, using
//! `tokio::process::Command`, and reporting back to the coordinator via
//! `SupervisorEvent`s.
//!
//! - [`command`] resolves the invocation and spawns the process.
//! - [`streams`] owns the stdout/stderr reader tasks and the exit waiter.
//! - [`sink`] provides the `CommandSink` trait and the concrete `StdinSink`
//!   that the coordinator writes commands to in production, and which tests
//!   can replace with a fake implementation.

pub mod command;
pub mod sink;
pub mod streams;

pub use command::{ChildProcess, Invocation, LaunchError, LaunchedEngine, launch, resolve_working_dir};
pub use sink::{CommandSink, SinkFuture, StdinSink, WriteError};
