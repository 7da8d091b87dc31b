//! Optional TOML settings file.
//!
//! Values here are the base layer; environment variables override them.
//!
//! ```toml
//! [docker]
//! stack_name = "wdio"
//! retry_count = 90
//! status_url = "http://localhost:4444/wd/hub/status"
//!
//! [site]
//! dir = "./build"
//! port = 8080
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub docker: DockerSettings,
    pub site: SiteSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DockerSettings {
    pub enabled: Option<bool>,
    pub binary: Option<String>,
    pub stack_name: Option<String>,
    pub compose_file: Option<PathBuf>,
    pub retry_count: Option<u32>,
    pub poll_interval_ms: Option<u64>,
    pub status_url: Option<String>,
    pub advertise_addr: Option<String>,
    pub command_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSettings {
    pub dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub index: Option<String>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&raw).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_partial() {
        let settings = Settings::parse(
            r#"
            [docker]
            stack_name = "e2e"
            retry_count = 5
            "#,
        )
        .unwrap();
        assert_eq!(settings.docker.stack_name.as_deref(), Some("e2e"));
        assert_eq!(settings.docker.retry_count, Some(5));
        assert!(settings.site.dir.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Settings::parse("[docker]\nretries = 5\n").is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[site]\nport = \"eighty\"").unwrap();

        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let err = Settings::load(Path::new("/nonexistent/harness.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
