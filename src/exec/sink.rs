// src/exec/sink.rs

//! Write side of the engine's line protocol.
//!
//! The coordinator talks to a `CommandSink` instead of a raw `ChildStdin`.
//! This makes it easy to swap in a recording sink in tests while keeping the
//! production implementation in [`StdinSink`].

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;

use crate::protocol::encode_command;

/// A write to the engine's stdin that could not happen because the target
/// is already gone. Never fatal: the coordinator logs it at debug level.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("stdin already closed")]
    Closed,

    #[error("engine stdin unavailable: {0}")]
    TargetGone(#[from] std::io::Error),
}

pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), WriteError>> + Send + 'a>>;

/// Trait abstracting the engine's stdin.
///
/// Production code uses [`StdinSink`]; tests can provide their own
/// implementation that records writes instead.
pub trait CommandSink: Send {
    /// Write one command followed by a single `\n` and flush it.
    fn write_line<'a>(&'a mut self, command: &'a str) -> SinkFuture<'a>;

    /// Close the stream, signalling end-of-input. Closing twice yields
    /// [`WriteError::Closed`].
    fn close(&mut self) -> SinkFuture<'_>;
}

/// The real engine stdin.
#[derive(Debug)]
pub struct StdinSink {
    stdin: Option<ChildStdin>,
}

impl StdinSink {
    pub fn new(stdin: ChildStdin) -> Self {
        Self { stdin: Some(stdin) }
    }
}

impl CommandSink for StdinSink {
    fn write_line<'a>(&'a mut self, command: &'a str) -> SinkFuture<'a> {
        Box::pin(write_command(&mut self.stdin, command))
    }

    fn close(&mut self) -> SinkFuture<'_> {
        Box::pin(close_stdin(&mut self.stdin))
    }
}

async fn write_command(stdin: &mut Option<ChildStdin>, command: &str) -> Result<(), WriteError> {
    let stdin = stdin.as_mut().ok_or(WriteError::Closed)?;
    stdin.write_all(&encode_command(command)).await?;
    stdin.flush().await?;
    Ok(())
}

async fn close_stdin(stdin: &mut Option<ChildStdin>) -> Result<(), WriteError> {
    // Dropping the handle closes the pipe even if shutdown fails.
    let mut stdin = stdin.take().ok_or(WriteError::Closed)?;
    stdin.shutdown().await?;
    Ok(())
}
