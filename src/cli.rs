// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::WorkingDirAnchor;

/// Command-line arguments for `engine-supervisor`.
///
/// Every flag overrides the matching value from the config file.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "engine-supervisor",
    version,
    about = "Spawn an engine process, wait for ENGINE_READY, feed it commands and exit with its code.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML).
    ///
    /// Optional: without it, the engine program must be given after `--`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Working directory of the engine, resolved against `--anchor`.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// What a relative working directory is resolved against.
    #[arg(long, value_enum, value_name = "ANCHOR")]
    pub anchor: Option<WorkingDirAnchor>,

    /// Delay between readiness and sending commands (e.g. "250ms", "2s").
    #[arg(long, value_name = "DURATION")]
    pub grace_period: Option<String>,

    /// Line that marks the engine as ready to receive commands.
    #[arg(long, value_name = "TOKEN")]
    pub ready_token: Option<String>,

    /// Command line to send once ready. Repeat to send several, in order.
    #[arg(long = "command", value_name = "CMD")]
    pub commands: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ENGINE_SUPERVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the invocation, but don't spawn anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Engine program followed by its arguments.
    #[arg(last = true, value_name = "PROGRAM")]
    pub engine: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    #[value(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
