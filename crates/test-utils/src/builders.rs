#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use engine_supervisor::config::{ConfigFile, ProtocolConfig, RawConfigFile};
use engine_supervisor::engine::{CommandQueue, CoordinatorOptions, CoreCoordinator};
use engine_supervisor::types::WorkingDirAnchor;

/// The four-line sequence the reference engine expects.
pub fn reference_commands() -> Vec<String> {
    ["Hello", "How are you?", "You should shutdown now.", "SIGHUP"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
    config_dir: Option<PathBuf>,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
            config_dir: None,
        }
    }

    pub fn program(mut self, program: &str) -> Self {
        self.config.engine.program = Some(program.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.engine.args.push(arg.to_string());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.engine.working_dir = Some(dir.into());
        self
    }

    pub fn anchor(mut self, anchor: WorkingDirAnchor) -> Self {
        self.config.engine.anchor = anchor;
        self
    }

    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    pub fn ready_token(mut self, token: &str) -> Self {
        self.config.protocol.ready_token = token.to_string();
        self
    }

    pub fn grace_period(mut self, period: &str) -> Self {
        self.config.protocol.grace_period = Some(period.to_string());
        self
    }

    pub fn commands(mut self, commands: &[&str]) -> Self {
        self.config.protocol.commands = commands.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config)
            .expect("Failed to build valid config from builder")
            .with_config_dir(self.config_dir)
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Protocol settings with the default token and the given grace period.
pub fn protocol(commands: Vec<String>, grace_period: Duration) -> ProtocolConfig {
    ProtocolConfig {
        ready_token: "ENGINE_READY".to_string(),
        grace_period,
        commands,
    }
}

/// A core coordinator wired with `protocol`.
pub fn core_for(protocol: &ProtocolConfig) -> CoreCoordinator {
    CoreCoordinator::new(
        CoordinatorOptions::from_protocol(protocol),
        CommandQueue::new(protocol.commands.clone()),
    )
}
