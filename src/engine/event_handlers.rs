// src/engine/event_handlers.rs

//! Event handling logic for the core coordinator.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::core::CoordinatorState;
use crate::engine::{
    CoordinatorOptions, DEFAULT_EXIT_CODE, FlushReport, Lifecycle, LineEvent,
    STREAM_DRAIN_TIMEOUT,
};
use crate::protocol::{LineKind, StreamDecodeError, classify_stdout};
use crate::types::StreamSource;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start the grace-period timer; it reports back with `GraceElapsed`.
    ScheduleGrace(Duration),
    /// Abort the pending grace-period timer.
    CancelGrace,
    /// Write these commands to stdin, in order, then close stdin. Reports
    /// back with `CommandsFlushed`.
    FlushCommands(Vec<String>),
    /// Kill the engine process (shutdown requested).
    KillEngine,
    /// Start the post-exit drain timer; it reports back with `DrainTimedOut`.
    AwaitStreamDrain(Duration),
}

/// Decision returned by the core after handling a single `SupervisorEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn proceed(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    fn stop(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: false,
        }
    }
}

/// Handle a decoded output line.
///
/// Every line is echoed. On stdout, an exact readiness token moves
/// `Starting → Ready` and either flushes the queue right away or schedules
/// the grace timer. Any later readiness token is ignored.
pub fn handle_line(
    state: &mut CoordinatorState,
    options: &CoordinatorOptions,
    event: LineEvent,
) -> CoreStep {
    info!(source = %event.source, "engine: {}", event.line);

    if event.source != StreamSource::Stdout
        || classify_stdout(&event.line, &options.ready_token) != LineKind::Ready
    {
        return CoreStep::proceed(Vec::new());
    }

    if state.lifecycle != Lifecycle::Starting {
        debug!(state = ?state.lifecycle, "readiness token seen again; ignoring");
        return CoreStep::proceed(Vec::new());
    }

    state.lifecycle = Lifecycle::Ready;
    state.reached_ready = true;
    info!("engine reported ready");

    if options.grace_period.is_zero() {
        return CoreStep::proceed(begin_flush(state));
    }

    debug!(
        grace_ms = options.grace_period.as_millis() as u64,
        "delaying commands for grace period"
    );
    state.grace_pending = true;
    CoreStep::proceed(vec![CoreCommand::ScheduleGrace(options.grace_period)])
}

/// Handle the grace timer firing. A no-op unless we are still waiting in
/// `Ready` (the engine may have exited or shutdown may have been requested
/// in the meantime).
pub fn handle_grace_elapsed(state: &mut CoordinatorState) -> CoreStep {
    if state.lifecycle != Lifecycle::Ready || !state.grace_pending {
        debug!(state = ?state.lifecycle, "grace period elapsed after it stopped mattering");
        return CoreStep::proceed(Vec::new());
    }
    state.grace_pending = false;
    CoreStep::proceed(begin_flush(state))
}

/// Handle the end of the command-sending routine: `Ready → ShuttingDown`.
pub fn handle_commands_flushed(state: &mut CoordinatorState, report: FlushReport) -> CoreStep {
    state.flush_in_flight = false;
    state.queue.record_flush(report);
    info!(
        written = state.queue.flushed(),
        unsent = state.queue.unsent(),
        stdin_closed = report.stdin_closed,
        "done sending commands"
    );

    match state.lifecycle {
        Lifecycle::Ready => state.lifecycle = Lifecycle::ShuttingDown,
        Lifecycle::Exited(_) if state.drained() => return CoreStep::stop(Vec::new()),
        _ => {}
    }
    CoreStep::proceed(Vec::new())
}

/// Handle a line that could not be decoded: log it and carry on.
pub fn handle_decode_failed(error: StreamDecodeError) -> CoreStep {
    warn!(source = %error.stream(), error = %error, "skipping undecodable engine output");
    CoreStep::proceed(Vec::new())
}

/// Handle end-of-stream on stdout or stderr.
pub fn handle_stream_closed(state: &mut CoordinatorState, source: StreamSource) -> CoreStep {
    state.mark_closed(source);
    debug!(source = %source, "engine stream closed");

    if matches!(state.lifecycle, Lifecycle::Exited(_)) && state.drained() {
        return CoreStep::stop(Vec::new());
    }
    CoreStep::proceed(Vec::new())
}

/// Handle process termination.
///
/// The exit code is captured once; the coordinator then waits for both
/// output streams to finish and for an in-flight command routine to report
/// (bounded by [`STREAM_DRAIN_TIMEOUT`]) before stopping.
pub fn handle_exit(state: &mut CoordinatorState, code: Option<i32>) -> CoreStep {
    if let Lifecycle::Exited(existing) = state.lifecycle {
        debug!(existing, ?code, "duplicate exit notification; ignoring");
        return CoreStep::proceed(Vec::new());
    }

    let exit_code = code.unwrap_or(DEFAULT_EXIT_CODE);
    let mut commands = Vec::new();

    if state.grace_pending {
        state.grace_pending = false;
        commands.push(CoreCommand::CancelGrace);
    }

    match state.lifecycle {
        Lifecycle::Starting => warn!(
            exit_code,
            unsent = state.queue.unsent(),
            "engine exited before reporting ready; commands were never sent"
        ),
        Lifecycle::Ready => warn!(
            exit_code,
            unsent = state.queue.unsent(),
            "engine exited while waiting to send commands"
        ),
        _ => info!(exit_code, "engine exited"),
    }
    if code.is_none() {
        debug!(exit_code, "engine reported no exit code; using default");
    }

    state.lifecycle = Lifecycle::Exited(exit_code);

    if state.drained() {
        return CoreStep::stop(commands);
    }
    commands.push(CoreCommand::AwaitStreamDrain(STREAM_DRAIN_TIMEOUT));
    CoreStep::proceed(commands)
}

/// Handle the drain timer: stop even though a stream is still open.
pub fn handle_drain_timed_out(state: &CoordinatorState) -> CoreStep {
    if !matches!(state.lifecycle, Lifecycle::Exited(_)) {
        return CoreStep::proceed(Vec::new());
    }
    warn!(
        sending = state.flush_in_flight,
        "engine output or stdin still busy after exit; stopping without it"
    );
    CoreStep::stop(Vec::new())
}

/// Handle a shutdown request: cancel pending work and kill the engine. The
/// coordinator keeps running until the exit notification arrives.
pub fn handle_shutdown_requested(state: &mut CoordinatorState) -> CoreStep {
    if matches!(state.lifecycle, Lifecycle::Exited(_)) {
        return CoreStep::proceed(Vec::new());
    }
    if state.kill_requested {
        debug!("shutdown already requested");
        return CoreStep::proceed(Vec::new());
    }

    info!(state = ?state.lifecycle, "shutdown requested; stopping engine");
    let mut commands = Vec::new();
    if state.grace_pending {
        state.grace_pending = false;
        commands.push(CoreCommand::CancelGrace);
    }
    commands.push(CoreCommand::KillEngine);

    state.kill_requested = true;
    state.lifecycle = Lifecycle::ShuttingDown;
    CoreStep::proceed(commands)
}

fn begin_flush(state: &mut CoordinatorState) -> Vec<CoreCommand> {
    match state.queue.begin_flush() {
        Some(commands) => {
            state.flush_in_flight = true;
            vec![CoreCommand::FlushCommands(commands)]
        }
        None => Vec::new(),
    }
}
