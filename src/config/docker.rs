use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::config::helpers::{EnvVars, optional_env, parse_bool_env, parse_optional_env};
use crate::config::settings::DockerSettings;
use crate::docker::{PollSettings, StackDescriptor};
use crate::error::ConfigError;

/// Name of the stack deployed for browser tests.
pub const DEFAULT_STACK_NAME: &str = "wdio";

/// Selenium status endpoint exposed by the bundled compose file.
pub const DEFAULT_STATUS_URL: &str = "http://localhost:4444/wd/hub/status";

/// Compose file shipped with the crate.
pub fn default_compose_file() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("docker")
        .join("docker-compose.yml")
}

/// Docker environment configuration.
#[derive(Debug, Clone)]
pub struct DockerConfig {
    /// Whether the Docker environment is managed at all.
    pub enabled: bool,
    /// Docker CLI binary.
    pub binary: String,
    pub stack_name: String,
    pub compose_file: PathBuf,
    /// Attempt budget for the teardown and readiness polls.
    pub retry_count: u32,
    pub poll_interval: Duration,
    pub status_url: Url,
    /// `--advertise-addr` for `docker swarm init` on multi-homed hosts.
    pub advertise_addr: Option<String>,
    /// Kill any single Docker command that runs longer than this.
    pub command_timeout: Option<Duration>,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "docker".to_string(),
            stack_name: DEFAULT_STACK_NAME.to_string(),
            compose_file: default_compose_file(),
            retry_count: 60,
            poll_interval: Duration::from_millis(1000),
            status_url: Url::parse(DEFAULT_STATUS_URL).expect("default status URL is valid"),
            advertise_addr: None,
            command_timeout: None,
        }
    }
}

impl DockerConfig {
    pub(crate) fn resolve(settings: &DockerSettings, env: &EnvVars) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let status_url = optional_env(env, "DOCKER_STATUS_URL").or_else(|| settings.status_url.clone());
        let status_url = match status_url {
            Some(raw) => Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
                key: "DOCKER_STATUS_URL".to_string(),
                message: format!("'{raw}' is not a valid URL: {e}"),
            })?,
            None => defaults.status_url,
        };

        let command_timeout_secs = parse_optional_env(
            env,
            "DOCKER_COMMAND_TIMEOUT_SECS",
            settings.command_timeout_secs.unwrap_or(0),
        )?;

        Ok(Self {
            enabled: parse_bool_env(
                env,
                "DOCKER_ENABLED",
                settings.enabled.unwrap_or(defaults.enabled),
            )?,
            binary: optional_env(env, "DOCKER_BIN")
                .or_else(|| settings.binary.clone())
                .unwrap_or(defaults.binary),
            stack_name: optional_env(env, "DOCKER_STACK_NAME")
                .or_else(|| settings.stack_name.clone())
                .unwrap_or(defaults.stack_name),
            compose_file: optional_env(env, "DOCKER_COMPOSE_FILE")
                .map(PathBuf::from)
                .or_else(|| settings.compose_file.clone())
                .unwrap_or(defaults.compose_file),
            retry_count: parse_optional_env(
                env,
                "DOCKER_RETRY_COUNT",
                settings.retry_count.unwrap_or(defaults.retry_count),
            )?,
            poll_interval: Duration::from_millis(parse_optional_env(
                env,
                "DOCKER_POLL_INTERVAL_MS",
                settings
                    .poll_interval_ms
                    .unwrap_or(defaults.poll_interval.as_millis() as u64),
            )?),
            status_url,
            advertise_addr: optional_env(env, "SWARM_ADVERTISE_ADDR")
                .or_else(|| settings.advertise_addr.clone()),
            command_timeout: (command_timeout_secs > 0)
                .then(|| Duration::from_secs(command_timeout_secs)),
        })
    }

    pub fn descriptor(&self) -> StackDescriptor {
        StackDescriptor::new(&self.stack_name, &self.compose_file)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            max_attempts: self.retry_count,
            interval: self.poll_interval,
        }
    }
}
