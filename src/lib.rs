// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod protocol;
pub mod types;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, ProtocolConfig, RawConfigFile, load_from_path};
use crate::engine::{
    CommandQueue, CoordinatorOptions, CoreCoordinator, EngineHandle, Runtime, SupervisorEvent,
    SupervisorOutcome,
};
use crate::errors::{Result, SupervisorError};
use crate::exec::{Invocation, launch};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - invocation resolution
/// - the supervised run (or a dry-run printout)
///
/// Returns the exit code the supervisor should terminate with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = build_config(&args)?;

    let program = cfg.engine.program.clone().ok_or_else(|| {
        SupervisorError::ConfigError(
            "no engine program configured; set [engine].program or pass it after `--`".to_string(),
        )
    })?;
    let invocation = Invocation::from_config(&cfg, program)?;

    if args.dry_run {
        print_dry_run(&invocation, &cfg.protocol);
        return Ok(0);
    }

    let outcome = supervise(invocation, &cfg.protocol).await?;
    Ok(outcome.exit_code)
}

/// Launch the engine and coordinate it until it exits.
///
/// Ctrl-C while supervising kills the engine; its exit is then reported as
/// usual.
pub async fn supervise(
    invocation: Invocation,
    protocol: &ProtocolConfig,
) -> Result<SupervisorOutcome> {
    let (tx, rx) = mpsc::channel::<SupervisorEvent>(64);

    let launched = launch(invocation, tx.clone())?;

    // Ctrl-C → kill the engine and wait for its exit.
    let ctrl_c = {
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                debug!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(SupervisorEvent::ShutdownRequested).await;
        })
    };

    let core = CoreCoordinator::new(
        CoordinatorOptions::from_protocol(protocol),
        CommandQueue::new(protocol.commands.clone()),
    );

    let runtime = Runtime::new(core, &tx, rx, launched.stdin).with_engine(EngineHandle {
        process: launched.process,
        kill: Some(launched.kill),
    });
    // The launcher tasks now hold the only strong senders besides Ctrl-C.
    drop(tx);

    let result = runtime.run().await;
    ctrl_c.abort();
    result
}

/// Merge the optional config file with CLI overrides and validate.
pub fn build_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "loading config");
            load_from_path(path)?
        }
        None => RawConfigFile::default(),
    };

    apply_cli_overrides(&mut raw, args);

    let config_dir = args
        .config
        .as_deref()
        .and_then(config::loader::config_dir_of);
    Ok(ConfigFile::try_from(raw)?.with_config_dir(config_dir))
}

fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some((program, rest)) = args.engine.split_first() {
        raw.engine.program = Some(program.clone());
        raw.engine.args = rest.to_vec();
    }
    if let Some(cwd) = &args.cwd {
        raw.engine.working_dir = Some(cwd.clone());
    }
    if let Some(anchor) = args.anchor {
        raw.engine.anchor = anchor;
    }
    if let Some(grace) = &args.grace_period {
        raw.protocol.grace_period = Some(grace.clone());
    }
    if let Some(token) = &args.ready_token {
        raw.protocol.ready_token = token.clone();
    }
    if !args.commands.is_empty() {
        raw.protocol.commands = args.commands.clone();
    }
}

/// Simple dry-run output: print the invocation and what would be sent.
fn print_dry_run(invocation: &Invocation, protocol: &ProtocolConfig) {
    println!("engine-supervisor dry-run");
    println!("  program: {}", invocation.program);
    if !invocation.args.is_empty() {
        println!("  args: {:?}", invocation.args);
    }
    println!("  working_dir: {}", invocation.working_dir.display());
    if !invocation.working_dir.is_dir() {
        println!("    (does not exist; launch would fail)");
    }
    println!("  ready_token: {}", protocol.ready_token);
    println!("  grace_period: {:?}", protocol.grace_period);
    println!();

    println!("commands ({}):", protocol.commands.len());
    for cmd in &protocol.commands {
        println!("  - {cmd}");
    }

    debug!("dry-run complete (no execution)");
}
