use std::path::PathBuf;

use crate::config::helpers::{EnvVars, optional_env, parse_optional_env};
use crate::config::settings::SiteSettings;
use crate::error::ConfigError;

/// Static site server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Directory to serve.
    pub dir: PathBuf,
    pub host: String,
    pub port: u16,
    /// File served for directory requests.
    pub index: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./build"),
            host: "0.0.0.0".to_string(),
            port: 8080,
            index: "index.html".to_string(),
        }
    }
}

impl SiteConfig {
    /// `None` unless a site directory is configured.
    pub(crate) fn resolve(
        settings: &SiteSettings,
        env: &EnvVars,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(dir) = optional_env(env, "SITE_DIR")
            .map(PathBuf::from)
            .or_else(|| settings.dir.clone())
        else {
            return Ok(None);
        };

        let defaults = Self::default();
        Ok(Some(Self {
            dir,
            host: optional_env(env, "SITE_HOST")
                .or_else(|| settings.host.clone())
                .unwrap_or(defaults.host),
            port: parse_optional_env(env, "SITE_PORT", settings.port.unwrap_or(defaults.port))?,
            index: optional_env(env, "SITE_INDEX")
                .or_else(|| settings.index.clone())
                .unwrap_or(defaults.index),
        }))
    }

    /// `host:port` label for logs and errors; IPv6 hosts are bracketed.
    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::helpers::env_of;

    #[test]
    fn test_disabled_without_dir() {
        let resolved = SiteConfig::resolve(&SiteSettings::default(), &env_of(&[])).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_dir_enables_with_defaults() {
        let env = env_of(&[("SITE_DIR", "dist")]);
        let site = SiteConfig::resolve(&SiteSettings::default(), &env)
            .unwrap()
            .unwrap();
        assert_eq!(site.dir, PathBuf::from("dist"));
        assert_eq!(site.addr(), "0.0.0.0:8080");
        assert_eq!(site.index, "index.html");
    }

    #[test]
    fn test_addr_label_brackets_ipv6() {
        let site = SiteConfig {
            host: "::1".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(site.addr(), "[::1]:3000");
    }

    #[test]
    fn test_bad_port() {
        let env = env_of(&[("SITE_DIR", "dist"), ("SITE_PORT", "99999")]);
        assert!(SiteConfig::resolve(&SiteSettings::default(), &env).is_err());
    }
}
