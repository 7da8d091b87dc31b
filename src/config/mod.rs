//! Configuration for the harness.
//!
//! Resolution order, lowest priority first:
//! 1. Built-in defaults
//! 2. Optional TOML settings file (`--config`)
//! 3. Environment variables (a `.env` file is loaded by the binary)

mod docker;
mod helpers;
mod settings;
mod site;

use std::path::Path;

pub use docker::{DEFAULT_STACK_NAME, DEFAULT_STATUS_URL, DockerConfig, default_compose_file};
pub use settings::{DockerSettings, Settings, SiteSettings};
pub use site::SiteConfig;

use crate::error::ConfigError;

/// Main configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub docker: DockerConfig,
    /// Static site server; `None` when no site directory is configured.
    pub site: Option<SiteConfig>,
}

impl Config {
    /// Resolve from an optional settings file plus the process environment.
    pub fn load(settings_path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match settings_path {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        Self::resolve(&settings, &helpers::process_env())
    }

    fn resolve(settings: &Settings, env: &helpers::EnvVars) -> Result<Self, ConfigError> {
        Ok(Self {
            docker: DockerConfig::resolve(&settings.docker, env)?,
            site: SiteConfig::resolve(&settings.site, env)?,
        })
    }
}
