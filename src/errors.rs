// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Layer-specific errors live next to the code that raises them:
//! [`crate::exec::LaunchError`], [`crate::exec::WriteError`] and
//! [`crate::protocol::StreamDecodeError`]. Only launch failures are fatal and
//! therefore surface here.

use thiserror::Error;

use crate::exec::LaunchError;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Launch error: {0}")]
    Launch(#[from] LaunchError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
