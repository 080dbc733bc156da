// tests/config_loading.rs

mod common;
use crate::common::{TestResult, init_tracing};

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tempfile::NamedTempFile;

use engine_supervisor::build_config;
use engine_supervisor::cli::CliArgs;
use engine_supervisor::config::load_and_validate;
use engine_supervisor::errors::SupervisorError;
use engine_supervisor::exec::Invocation;
use engine_supervisor::types::WorkingDirAnchor;
use engine_supervisor_test_utils::builders::ConfigFileBuilder;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_config_is_parsed() -> TestResult {
    init_tracing();

    let file = write_config(
        r#"
[engine]
program = "java"
args = ["-cp", "deps.jar:engine.jar", "org.machine.engine.Main"]
working_dir = "../target/scala-2.11"
anchor = "config"

[protocol]
ready_token = "ENGINE_READY"
grace_period = "500ms"
commands = ["Hello", "SIGHUP"]
"#,
    );

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.engine.program.as_deref(), Some("java"));
    assert_eq!(cfg.engine.args.len(), 3);
    assert_eq!(cfg.engine.anchor, WorkingDirAnchor::Config);
    assert_eq!(cfg.protocol.grace_period, Duration::from_millis(500));
    assert_eq!(cfg.protocol.commands, vec!["Hello", "SIGHUP"]);

    // Relative working dir resolves against the config file's directory.
    let config_dir = file.path().parent().unwrap().to_path_buf();
    assert_eq!(cfg.config_dir.as_deref(), Some(config_dir.as_path()));
    let inv = Invocation::from_config(&cfg, "java".into())?;
    assert_eq!(inv.working_dir, config_dir.join("../target/scala-2.11"));
    Ok(())
}

#[test]
fn empty_config_uses_reference_protocol() -> TestResult {
    let file = write_config("");
    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.protocol.ready_token, "ENGINE_READY");
    assert_eq!(cfg.protocol.grace_period, Duration::ZERO);
    assert_eq!(
        cfg.protocol.commands,
        vec!["Hello", "How are you?", "You should shutdown now.", "SIGHUP"]
    );
    Ok(())
}

#[test]
fn bad_grace_period_returns_config_error() {
    let file = write_config(
        r#"
[protocol]
grace_period = "soon"
"#,
    );

    match load_and_validate(file.path()) {
        Err(SupervisorError::ConfigError(msg)) => assert!(msg.contains("grace_period")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn unknown_anchor_and_keys_are_toml_errors() {
    let file = write_config(
        r#"
[engine]
program = "java"
anchor = "home"
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(SupervisorError::TomlError(_))
    ));

    let file = write_config(
        r#"
[engine]
programme = "java"
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(SupervisorError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_io_error() {
    let result = load_and_validate("/definitely/not/here/Engine.toml");
    assert!(matches!(result, Err(SupervisorError::IoError(_))));
}

#[test]
fn cli_overrides_config_file() -> TestResult {
    let file = write_config(
        r#"
[engine]
program = "java"
args = ["-jar", "engine.jar"]

[protocol]
commands = ["from-file"]
"#,
    );
    let config_path = file.path().to_string_lossy().to_string();

    let args = CliArgs::try_parse_from([
        "engine-supervisor",
        "--config",
        config_path.as_str(),
        "--grace-period",
        "2s",
        "--command",
        "Hello",
        "--command",
        "SIGHUP",
        "--anchor",
        "cwd",
        "--cwd",
        "engine",
        "--",
        "node",
        "engine.js",
    ])?;

    let cfg = build_config(&args)?;
    assert_eq!(cfg.engine.program.as_deref(), Some("node"));
    assert_eq!(cfg.engine.args, vec!["engine.js"]);
    assert_eq!(cfg.engine.anchor, WorkingDirAnchor::Cwd);
    assert_eq!(cfg.engine.working_dir, Some(PathBuf::from("engine")));
    assert_eq!(cfg.protocol.grace_period, Duration::from_secs(2));
    assert_eq!(cfg.protocol.commands, vec!["Hello", "SIGHUP"]);
    Ok(())
}

#[test]
fn cli_values_are_validated_too() -> TestResult {
    let args = CliArgs::try_parse_from(["engine-supervisor", "--ready-token", "  ", "--", "sh"])?;
    assert!(matches!(
        build_config(&args),
        Err(SupervisorError::ConfigError(_))
    ));
    Ok(())
}

#[tokio::test]
async fn missing_program_is_reported() -> TestResult {
    let args = CliArgs::try_parse_from(["engine-supervisor", "--dry-run"])?;
    match engine_supervisor::run(args).await {
        Err(SupervisorError::ConfigError(msg)) => assert!(msg.contains("no engine program")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn dry_run_does_not_spawn() -> TestResult {
    let args = CliArgs::try_parse_from([
        "engine-supervisor",
        "--dry-run",
        "--cwd",
        "/definitely/not/here",
        "--",
        "engine-supervisor-no-such-engine",
    ])?;
    assert_eq!(engine_supervisor::run(args).await?, 0);
    Ok(())
}

#[test]
fn builder_config_dir_feeds_config_anchor() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .program("java")
        .working_dir("lib")
        .config_dir("/opt/harness")
        .build();
    let inv = Invocation::from_config(&cfg, "java".into())?;
    assert_eq!(inv.working_dir, PathBuf::from("/opt/harness/lib"));
    Ok(())
}

/// Sanity-check that demos/Engine.toml is wired the way it describes.
#[test]
fn demo_config_is_parsed_correctly() -> TestResult {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cfg = load_and_validate(manifest_dir.join("demos/Engine.toml"))?;

    assert_eq!(cfg.engine.program.as_deref(), Some("java"));
    assert_eq!(cfg.engine.args.last().map(String::as_str), Some("org.machine.engine.Main"));
    assert_eq!(cfg.protocol.commands.last().map(String::as_str), Some("SIGHUP"));

    let inv = Invocation::from_config(&cfg, "java".into())?;
    assert_eq!(inv.working_dir, manifest_dir.join("demos/../target/scala-2.11"));
    Ok(())
}
