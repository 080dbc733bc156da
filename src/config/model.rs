// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::WorkingDirAnchor;

/// Readiness token used when `[protocol].ready_token` is not set.
pub const DEFAULT_READY_TOKEN: &str = "ENGINE_READY";

/// Command sequence sent when `[protocol].commands` is not set.
///
/// `SIGHUP` is the line the engine treats as "begin graceful shutdown".
pub const DEFAULT_COMMANDS: [&str; 4] = [
    "Hello",
    "How are you?",
    "You should shutdown now.",
    "SIGHUP",
];

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [engine]
/// program = "java"
/// args = ["-cp", "deps.jar:engine.jar", "org.machine.engine.Main"]
/// working_dir = "../target/scala-2.11"
/// anchor = "config"
///
/// [protocol]
/// ready_token = "ENGINE_READY"
/// grace_period = "500ms"
/// commands = ["Hello", "SIGHUP"]
/// ```
///
/// All sections are optional and have reasonable defaults. This is the raw
/// deserialised form; use [`ConfigFile`] after validation.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// How to launch the engine, from `[engine]`.
    #[serde(default)]
    pub engine: EngineSection,

    /// Line protocol settings, from `[protocol]`.
    #[serde(default)]
    pub protocol: ProtocolSection,
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Executable to launch (looked up on `PATH` if not a path).
    ///
    /// May be left out of the file and given on the command line instead.
    #[serde(default)]
    pub program: Option<String>,

    /// Arguments passed to `program`, in order.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory of the engine. Relative paths are resolved against
    /// `anchor`; if unset, the anchor directory itself is used.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// `"config"` (default), `"cwd"` or `"executable"`.
    #[serde(default)]
    pub anchor: WorkingDirAnchor,
}

/// `[protocol]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolSection {
    /// Exact line (after trimming) that marks the engine as ready.
    #[serde(default = "default_ready_token")]
    pub ready_token: String,

    /// Duration string (e.g. `"500ms"`) to wait after readiness before
    /// sending commands. `None` means send immediately.
    #[serde(default)]
    pub grace_period: Option<String>,

    /// Commands written to the engine's stdin once it is ready, one per line.
    #[serde(default = "default_commands")]
    pub commands: Vec<String>,
}

fn default_ready_token() -> String {
    DEFAULT_READY_TOKEN.to_string()
}

fn default_commands() -> Vec<String> {
    DEFAULT_COMMANDS.iter().map(|c| c.to_string()).collect()
}

impl Default for ProtocolSection {
    fn default() -> Self {
        Self {
            ready_token: default_ready_token(),
            grace_period: None,
            commands: default_commands(),
        }
    }
}

/// Validated configuration.
///
/// Obtained via `ConfigFile::try_from(raw)`, which checks the invariants in
/// [`crate::config::validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub engine: EngineSection,
    pub protocol: ProtocolConfig,
    /// Directory of the config file, if one was loaded. Used by
    /// [`WorkingDirAnchor::Config`].
    pub config_dir: Option<PathBuf>,
}

/// Validated `[protocol]` section with the grace period already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    pub ready_token: String,
    pub grace_period: Duration,
    pub commands: Vec<String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(engine: EngineSection, protocol: ProtocolConfig) -> Self {
        Self {
            engine,
            protocol,
            config_dir: None,
        }
    }

    /// Remember which directory the config file lives in.
    pub fn with_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config_dir = dir;
        self
    }
}
