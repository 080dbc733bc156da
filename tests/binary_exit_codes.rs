// tests/binary_exit_codes.rs
//
// The built binary, end to end: its own exit status mirrors the engine's.
#![cfg(unix)]

use std::process::{Command, Output, Stdio};

const BIN: &str = env!("CARGO_BIN_EXE_engine-supervisor");

fn supervisor(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env("ENGINE_SUPERVISOR_LOG", "warn")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run engine-supervisor binary")
}

#[test]
fn exits_with_the_engine_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let cwd = dir.path().to_string_lossy().to_string();

    let out = supervisor(&[
        "--cwd",
        &cwd,
        "--",
        "sh",
        "-c",
        "echo ENGINE_READY; cat >/dev/null; exit 7",
    ]);
    assert_eq!(out.status.code(), Some(7), "stderr: {}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn reference_engine_run_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let cwd = dir.path().to_string_lossy().to_string();

    let out = supervisor(&[
        "--cwd",
        &cwd,
        "--",
        "sh",
        "-c",
        engine_supervisor_test_utils::stub::REFERENCE_ENGINE,
    ]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn missing_working_directory_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("target/scala-2.11");

    let out = supervisor(&[
        "--cwd",
        &missing.to_string_lossy(),
        "--",
        "sh",
        "-c",
        "exit 0",
    ]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("working directory"), "stderr: {stderr}");
}

#[test]
fn configuration_error_exits_one() {
    let out = supervisor(&["--grace-period", "soon", "--", "sh", "-c", "exit 0"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("grace_period"));
}

#[test]
fn dry_run_prints_the_queue_and_exits_zero() {
    let out = supervisor(&["--dry-run", "--command", "Hello", "--", "sh", "-c", "exit 9"]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("program: sh"));
    assert!(stdout.contains("- Hello"));
}
