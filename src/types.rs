use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

/// What a relative engine working directory is resolved against.
///
/// - `Config`: the directory containing the config file (falls back to the
///   current directory when no config file is used).
/// - `Cwd`: the supervisor's current working directory.
/// - `Executable`: the directory containing the supervisor binary itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WorkingDirAnchor {
    #[default]
    Config,
    Cwd,
    Executable,
}

/// Which of the engine's output streams a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl StreamSource {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamSource::Stdout => "stdout",
            StreamSource::Stderr => "stderr",
        }
    }
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
