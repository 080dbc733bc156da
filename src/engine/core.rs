// src/engine/core.rs

//! Pure core coordinator state machine.
//!
//! This module contains a synchronous, deterministic "core coordinator" that
//! consumes [`SupervisorEvent`]s and produces:
//! - an updated lifecycle state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from the channel
//! - writing commands to the engine's stdin
//! - running the grace and drain timers
//! - killing the engine on shutdown
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, or processes.

use crate::engine::event_handlers::{
    CoreStep, handle_commands_flushed, handle_decode_failed, handle_drain_timed_out,
    handle_exit, handle_grace_elapsed, handle_line, handle_shutdown_requested,
    handle_stream_closed,
};
use crate::engine::queue::CommandQueue;
use crate::engine::{CoordinatorOptions, Lifecycle, SupervisorEvent, SupervisorOutcome};
use crate::types::StreamSource;

/// Mutable state shared by the event handlers.
#[derive(Debug)]
pub struct CoordinatorState {
    pub lifecycle: Lifecycle,
    pub queue: CommandQueue,
    pub reached_ready: bool,
    pub grace_pending: bool,
    pub kill_requested: bool,
    /// The command-sending routine is running and has not reported back.
    pub flush_in_flight: bool,
    stdout_open: bool,
    stderr_open: bool,
}

impl CoordinatorState {
    fn new(queue: CommandQueue) -> Self {
        Self {
            lifecycle: Lifecycle::Starting,
            queue,
            reached_ready: false,
            grace_pending: false,
            kill_requested: false,
            flush_in_flight: false,
            stdout_open: true,
            stderr_open: true,
        }
    }

    pub fn mark_closed(&mut self, source: StreamSource) {
        match source {
            StreamSource::Stdout => self.stdout_open = false,
            StreamSource::Stderr => self.stderr_open = false,
        }
    }

    pub fn all_streams_closed(&self) -> bool {
        !self.stdout_open && !self.stderr_open
    }

    /// Nothing left to wait for once the engine has exited.
    pub fn drained(&self) -> bool {
        self.all_streams_closed() && !self.flush_in_flight
    }
}

/// Pure core coordinator.
///
/// Owns the lifecycle state and the command queue. It has **no** channels,
/// no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreCoordinator {
    state: CoordinatorState,
    options: CoordinatorOptions,
}

impl CoreCoordinator {
    pub fn new(options: CoordinatorOptions, queue: CommandQueue) -> Self {
        Self {
            state: CoordinatorState::new(queue),
            options,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lifecycle
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.state.queue
    }

    /// Summary of the lifecycle; `None` until the engine has exited.
    pub fn outcome(&self) -> Option<SupervisorOutcome> {
        match self.state.lifecycle {
            Lifecycle::Exited(exit_code) => Some(SupervisorOutcome {
                exit_code,
                reached_ready: self.state.reached_ready,
                commands_flushed: self.state.queue.flushed(),
                stdin_closed: self.state.queue.stdin_closed(),
            }),
            _ => None,
        }
    }

    /// Handle a single event, updating state and returning the resulting
    /// commands for the IO shell.
    pub fn step(&mut self, event: SupervisorEvent) -> CoreStep {
        match event {
            SupervisorEvent::Line(line) => handle_line(&mut self.state, &self.options, line),
            SupervisorEvent::DecodeFailed(error) => handle_decode_failed(error),
            SupervisorEvent::StreamClosed(source) => {
                handle_stream_closed(&mut self.state, source)
            }
            SupervisorEvent::Exited { code } => handle_exit(&mut self.state, code),
            SupervisorEvent::GraceElapsed => handle_grace_elapsed(&mut self.state),
            SupervisorEvent::CommandsFlushed(report) => {
                handle_commands_flushed(&mut self.state, report)
            }
            SupervisorEvent::DrainTimedOut => handle_drain_timed_out(&self.state),
            SupervisorEvent::ShutdownRequested => handle_shutdown_requested(&mut self.state),
        }
    }
}
