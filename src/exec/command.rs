// src/exec/command.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::config::ConfigFile;
use crate::engine::SupervisorEvent;
use crate::exec::sink::StdinSink;
use crate::exec::streams::{spawn_exit_waiter, spawn_stream_reader};
use crate::types::{StreamSource, WorkingDirAnchor};

/// The engine could not be started. Always fatal; never retried.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("invalid working directory {}: not an existing directory", .path.display())]
    InvalidWorkingDir { path: PathBuf },

    #[error("could not resolve {0}")]
    AnchorUnavailable(String),

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("spawned engine has no {0} pipe")]
    MissingPipe(&'static str),
}

/// Fully resolved engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl Invocation {
    /// Build the invocation from a validated config. `program` must already
    /// be set (the CLI merges it in before validation).
    pub fn from_config(cfg: &ConfigFile, program: String) -> Result<Self, LaunchError> {
        let working_dir = resolve_working_dir(
            cfg.engine.working_dir.as_deref(),
            cfg.engine.anchor,
            cfg.config_dir.as_deref(),
        )?;
        Ok(Self {
            program,
            args: cfg.engine.args.clone(),
            working_dir,
        })
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        write!(f, " (in {})", self.working_dir.display())
    }
}

/// Resolve the engine's working directory against its anchor.
///
/// Absolute paths are taken as-is. A missing `working_dir` means the anchor
/// directory itself. Existence is checked at launch, not here.
pub fn resolve_working_dir(
    working_dir: Option<&Path>,
    anchor: WorkingDirAnchor,
    config_dir: Option<&Path>,
) -> Result<PathBuf, LaunchError> {
    if let Some(dir) = working_dir.filter(|d| d.is_absolute()) {
        return Ok(dir.to_path_buf());
    }

    let base = anchor_dir(anchor, config_dir)?;
    Ok(match working_dir {
        Some(dir) => base.join(dir),
        None => base,
    })
}

fn anchor_dir(anchor: WorkingDirAnchor, config_dir: Option<&Path>) -> Result<PathBuf, LaunchError> {
    match (anchor, config_dir) {
        (WorkingDirAnchor::Config, Some(dir)) => Ok(dir.to_path_buf()),
        (WorkingDirAnchor::Config, None) | (WorkingDirAnchor::Cwd, _) => std::env::current_dir()
            .map_err(|e| LaunchError::AnchorUnavailable(format!("current directory: {e}"))),
        (WorkingDirAnchor::Executable, _) => {
            let exe = std::env::current_exe()
                .map_err(|e| LaunchError::AnchorUnavailable(format!("supervisor executable: {e}")))?;
            exe.parent().map(Path::to_path_buf).ok_or_else(|| {
                LaunchError::AnchorUnavailable(format!(
                    "directory of executable {}",
                    exe.display()
                ))
            })
        }
    }
}

/// The one engine process owned by the coordinator.
#[derive(Debug, Clone)]
pub struct ChildProcess {
    pub invocation: Invocation,
    /// OS process id; `None` only if the process was already reaped.
    pub pid: Option<u32>,
}

/// Handles returned by [`launch`].
///
/// stdout, stderr and the exit notification are already wired into the
/// event channel; what remains is the write side and the kill switch.
#[derive(Debug)]
pub struct LaunchedEngine {
    pub process: ChildProcess,
    pub stdin: StdinSink,
    pub kill: oneshot::Sender<()>,
}

/// Spawn the engine and attach its streams to the coordinator's channel.
///
/// - stdout and stderr each get a reader task emitting `Line`,
///   `DecodeFailed` and finally `StreamClosed`.
/// - an exit-waiter task emits `Exited` when the OS reports termination, and
///   kills the process first if the returned `kill` sender fires.
pub fn launch(
    invocation: Invocation,
    events: mpsc::Sender<SupervisorEvent>,
) -> Result<LaunchedEngine, LaunchError> {
    if !invocation.working_dir.is_dir() {
        return Err(LaunchError::InvalidWorkingDir {
            path: invocation.working_dir.clone(),
        });
    }

    info!(engine = %invocation, "starting engine process");

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .current_dir(&invocation.working_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
        program: invocation.program.clone(),
        source,
    })?;

    let pid = child.id();
    let stdin = child.stdin.take().ok_or(LaunchError::MissingPipe("stdin"))?;
    let stdout = child.stdout.take().ok_or(LaunchError::MissingPipe("stdout"))?;
    let stderr = child.stderr.take().ok_or(LaunchError::MissingPipe("stderr"))?;

    info!(pid = ?pid, "engine process started");

    spawn_stream_reader(stdout, StreamSource::Stdout, events.clone());
    spawn_stream_reader(stderr, StreamSource::Stderr, events.clone());

    let (kill_tx, kill_rx) = oneshot::channel();
    spawn_exit_waiter(child, kill_rx, events);

    Ok(LaunchedEngine {
        process: ChildProcess { invocation, pid },
        stdin: StdinSink::new(stdin),
        kill: kill_tx,
    })
}
