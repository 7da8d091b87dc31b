use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::ConfigError;

/// Snapshot of environment variables used during resolution.
pub(crate) type EnvVars = HashMap<String, String>;

/// Capture the process environment.
pub(crate) fn process_env() -> EnvVars {
    std::env::vars().collect()
}

/// Read a variable, treating empty values as unset.
pub(crate) fn optional_env(env: &EnvVars, key: &str) -> Option<String> {
    env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Parse a variable, falling back to `default` when it is unset.
pub(crate) fn parse_optional_env<T>(env: &EnvVars, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    optional_env(env, key)
        .map(|s| s.parse::<T>())
        .transpose()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
        .map(|v| v.unwrap_or(default))
}

/// Parse a `true`/`false` variable.
pub(crate) fn parse_bool_env(env: &EnvVars, key: &str, default: bool) -> Result<bool, ConfigError> {
    optional_env(env, key)
        .map(|s| s.parse())
        .transpose()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("must be 'true' or 'false': {e}"),
        })
        .map(|v| v.unwrap_or(default))
}

#[cfg(test)]
pub(crate) fn env_of(pairs: &[(&str, &str)]) -> EnvVars {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
