//! Stub engines written as `sh` scripts.

use std::path::Path;

use engine_supervisor::exec::Invocation;

/// Engine that announces readiness, reads stdin until end-of-input, and
/// exits 0 only if it received exactly the reference command sequence in
/// order; 9 otherwise.
pub const REFERENCE_ENGINE: &str = r#"
echo ENGINE_READY
got=""
while IFS= read -r line; do
  echo "got: $line"
  got="$got${got:+|}$line"
done
if [ "$got" = "Hello|How are you?|You should shutdown now.|SIGHUP" ]; then exit 0; else exit 9; fi
"#;

/// Invocation running `script` with `sh -c` inside `working_dir`.
pub fn sh_invocation(script: &str, working_dir: &Path) -> Invocation {
    Invocation {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        working_dir: working_dir.to_path_buf(),
    }
}
