// src/engine/mod.rs

//! Protocol coordinator for a supervised engine process.
//!
//! This module ties together:
//! - the lifecycle state machine (`Starting → Ready → ShuttingDown → Exited`)
//! - the outbound command queue
//! - the runtime event loop that reacts to:
//!   - decoded stdout / stderr lines
//!   - end of the output streams
//!   - process exit
//!   - the grace-period and stream-drain timers
//!   - shutdown requests (Ctrl-C)
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::time::Duration;

use crate::protocol::StreamDecodeError;
use crate::types::StreamSource;

/// How long to keep echoing engine output after the process has exited,
/// waiting for both pipes to report end-of-stream.
pub const STREAM_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Exit code reported when the OS gives none (e.g. the engine was killed by
/// a signal).
pub const DEFAULT_EXIT_CODE: i32 = 0;

/// Lifecycle of the supervised engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Spawned, waiting for the readiness token.
    Starting,
    /// Readiness seen; commands are about to be (or being) sent.
    Ready,
    /// Commands were sent and stdin closed, or shutdown was requested.
    ShuttingDown,
    /// The OS reported termination with this code. Terminal.
    Exited(i32),
}

/// A single decoded line of engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvent {
    pub source: StreamSource,
    pub line: String,
}

/// Result of one run of the command-sending routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushReport {
    /// Commands fully written to stdin.
    pub written: usize,
    /// Whether stdin was closed by this flush.
    pub stdin_closed: bool,
}

/// Events flowing into the coordinator from the launcher, timers, etc.
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// A complete line arrived on stdout or stderr.
    Line(LineEvent),
    /// A line on one of the streams was not valid UTF-8.
    DecodeFailed(StreamDecodeError),
    /// The given stream reached end-of-file.
    StreamClosed(StreamSource),
    /// The engine process terminated. `None` if the OS reported no code.
    Exited { code: Option<i32> },
    /// The grace period after readiness elapsed.
    GraceElapsed,
    /// The command-sending routine finished.
    CommandsFlushed(FlushReport),
    /// Output streams did not close in time after exit.
    DrainTimedOut,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Options for the coordinator core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Exact stdout line (after trimming) that marks readiness.
    pub ready_token: String,
    /// Delay between readiness and sending commands; zero means immediately.
    pub grace_period: Duration,
}

impl CoordinatorOptions {
    pub fn from_protocol(protocol: &crate::config::ProtocolConfig) -> Self {
        Self {
            ready_token: protocol.ready_token.clone(),
            grace_period: protocol.grace_period,
        }
    }
}

/// What the coordinator observed over one engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOutcome {
    /// Code the supervisor should exit with (the engine's own code).
    pub exit_code: i32,
    /// Whether the readiness token was ever seen.
    pub reached_ready: bool,
    /// Number of queued commands written to stdin.
    pub commands_flushed: usize,
    /// Whether stdin was closed after the commands.
    pub stdin_closed: bool,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use self::core::CoreCoordinator;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::CommandQueue;
pub use runtime::{EngineHandle, Runtime};
