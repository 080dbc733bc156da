// src/config/mod.rs

//! Configuration loading and validation for engine-supervisor.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate protocol invariants and parse durations (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    ConfigFile, DEFAULT_COMMANDS, DEFAULT_READY_TOKEN, EngineSection, ProtocolConfig,
    ProtocolSection, RawConfigFile,
};
pub use validate::parse_duration;
