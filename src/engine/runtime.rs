// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::{ChildProcess, CommandSink, WriteError};

use super::core::CoreCoordinator;
use super::{CoreCommand, FlushReport, SupervisorEvent, SupervisorOutcome};

/// The launched engine as seen by the runtime: its identity plus the switch
/// that asks the exit waiter to kill it.
#[derive(Debug)]
pub struct EngineHandle {
    pub process: ChildProcess,
    pub kill: Option<oneshot::Sender<()>>,
}

/// Drives the coordinator core in response to `SupervisorEvent`s, and
/// delegates stdin writes to a `CommandSink`.
///
/// This is a pure IO shell around `CoreCoordinator`, which contains all the
/// lifecycle semantics. Classification happens on the loop's task; the
/// command-sending routine runs on a task of its own that owns the sink, so
/// a full stdin pipe never stops engine output from being consumed.
pub struct Runtime<S: CommandSink> {
    core: CoreCoordinator,
    event_rx: mpsc::Receiver<SupervisorEvent>,
    /// Timers and the flush task post back through this; weak so that the
    /// channel still closes once every producer is gone.
    self_tx: mpsc::WeakSender<SupervisorEvent>,
    /// Handed to the flush task, which is the only writer.
    sink: Option<S>,
    engine: Option<EngineHandle>,
    grace_timer: Option<JoinHandle<()>>,
    drain_timer: Option<JoinHandle<()>>,
    flush_task: Option<JoinHandle<()>>,
}

impl<S: CommandSink> fmt::Debug for Runtime<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("engine", &self.engine)
            .field("sending", &self.flush_task.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: CommandSink + 'static> Runtime<S> {
    pub fn new(
        core: CoreCoordinator,
        event_tx: &mpsc::Sender<SupervisorEvent>,
        event_rx: mpsc::Receiver<SupervisorEvent>,
        sink: S,
    ) -> Self {
        Self {
            core,
            event_rx,
            self_tx: event_tx.downgrade(),
            sink: Some(sink),
            engine: None,
            grace_timer: None,
            drain_timer: None,
            flush_task: None,
        }
    }

    /// Attach the launched engine so shutdown requests can kill it.
    pub fn with_engine(mut self, engine: EngineHandle) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Main event loop.
    ///
    /// - Consumes `SupervisorEvent`s from `event_rx`.
    /// - Feeds them into the core.
    /// - Executes commands returned by the core without waiting on IO;
    ///   timers and the flush task report back through the channel.
    ///
    /// Returns once the engine has exited and its output has drained.
    pub async fn run(mut self) -> Result<SupervisorOutcome> {
        info!("coordinator started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                self.abort_tasks();
                return Err(anyhow!("event channel closed before the engine exited").into());
            };

            debug!(?event, "coordinator received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                break;
            }
        }

        self.abort_tasks();

        let outcome = self
            .core
            .outcome()
            .ok_or_else(|| anyhow!("coordinator stopped before the engine exited"))?;
        info!(
            exit_code = outcome.exit_code,
            commands_flushed = outcome.commands_flushed,
            "coordinator exiting"
        );
        Ok(outcome)
    }

    /// Execute a single command from the core.
    fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::ScheduleGrace(delay) => {
                self.grace_timer = self.schedule(delay, SupervisorEvent::GraceElapsed);
            }
            CoreCommand::CancelGrace => {
                if let Some(timer) = self.grace_timer.take() {
                    debug!("cancelling grace timer");
                    timer.abort();
                }
            }
            CoreCommand::FlushCommands(commands) => self.spawn_flush(commands),
            CoreCommand::KillEngine => self.kill_engine(),
            CoreCommand::AwaitStreamDrain(limit) => {
                self.drain_timer = self.schedule(limit, SupervisorEvent::DrainTimedOut);
            }
        }
    }

    /// Hand the sink to a task that sends every command and reports back with
    /// `CommandsFlushed`.
    fn spawn_flush(&mut self, commands: Vec<String>) {
        let Some(mut sink) = self.sink.take() else {
            debug!("engine stdin already handed off; not sending again");
            return;
        };
        let Some(tx) = self.self_tx.upgrade() else {
            debug!("event channel closed; not sending commands");
            return;
        };
        self.flush_task = Some(tokio::spawn(async move {
            let report = flush_commands(&mut sink, &commands).await;
            let _ = tx.send(SupervisorEvent::CommandsFlushed(report)).await;
        }));
    }

    fn kill_engine(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            debug!("no engine attached; nothing to kill");
            return;
        };
        match engine.kill.take() {
            Some(kill) => {
                info!(pid = ?engine.process.pid, "requesting engine kill");
                if kill.send(()).is_err() {
                    debug!("engine already reaped while killing");
                }
            }
            None => debug!("engine kill already requested"),
        }
    }

    fn schedule(&self, delay: Duration, event: SupervisorEvent) -> Option<JoinHandle<()>> {
        let Some(tx) = self.self_tx.upgrade() else {
            debug!(?event, "event channel closed; not scheduling timer");
            return None;
        };
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event).await;
        }))
    }

    fn abort_tasks(&mut self) {
        if let Some(flush) = self.flush_task.take() {
            if !flush.is_finished() {
                debug!("abandoning command routine still blocked on engine stdin");
            }
            flush.abort();
        }
        for timer in [self.grace_timer.take(), self.drain_timer.take()]
            .into_iter()
            .flatten()
        {
            timer.abort();
        }
    }
}

/// The command-sending routine: every command in order, then close stdin.
///
/// A failed write means the engine's stdin is already gone; the remaining
/// commands are skipped and the failure is only logged.
async fn flush_commands<S: CommandSink>(sink: &mut S, commands: &[String]) -> FlushReport {
    info!(count = commands.len(), "sending commands to engine");

    let mut written = 0;
    for command in commands {
        info!(command = %command, "sending command");
        match sink.write_line(command).await {
            Ok(()) => written += 1,
            Err(e) => {
                debug!(error = %e, command = %command, "write to engine stdin failed; skipping remaining commands");
                break;
            }
        }
    }

    let stdin_closed = match sink.close().await {
        Ok(()) => true,
        Err(WriteError::Closed) => {
            debug!("engine stdin was already closed");
            false
        }
        Err(e) => {
            debug!(error = %e, "closing engine stdin failed; handle dropped anyway");
            true
        }
    };

    FlushReport {
        written,
        stdin_closed,
    }
}
