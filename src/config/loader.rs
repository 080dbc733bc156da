// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize `Engine.toml`-style config without semantic checks.
///
/// Unknown keys and anchors are already rejected here by serde; use
/// [`load_and_validate`] for everything else.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading config file");
    let raw = toml::from_str::<RawConfigFile>(&fs::read_to_string(path)?)?;
    Ok(raw)
}

/// Load a configuration file from path and run validation.
///
/// The returned config remembers the file's directory so that
/// `anchor = "config"` resolves relative working directories against it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config.with_config_dir(config_dir_of(path)))
}

/// Directory a config file lives in; `None` for a bare file name, which the
/// launcher then treats as the current directory.
pub(crate) fn config_dir_of(path: &Path) -> Option<PathBuf> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Some(parent.to_path_buf()),
        _ => None,
    }
}
