use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::client::FailurePolicy;

pub const CONFIG_ENV: &str = "SEEKGPT_CONFIG";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub system: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Option<u64>,
    pub retries: Option<u32>,
    pub retry_delay: Option<u64>,
    pub failure_policy: Option<FailurePolicy>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot resolve config path: set SEEKGPT_CONFIG or HOME/XDG_CONFIG_HOME.")]
    NoPath,

    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Config file '{}' does not contain a [profiles] section.", .path.display())]
    NoProfiles { path: PathBuf },

    #[error("Profile '{name}' not found in config file '{}'.", .path.display())]
    ProfileNotFound { name: String, path: PathBuf },
}

pub fn load_profile(name: &str) -> Result<ProfileConfig, ConfigError> {
    let path = config_path()?;
    let profiles = read_profiles(&path)?;

    profiles
        .get(name)
        .cloned()
        .ok_or_else(|| ConfigError::ProfileNotFound {
            name: name.to_string(),
            path,
        })
}

/// Parses the config file and, when given, checks that `profile` exists.
pub fn validate_config(profile: Option<&str>) -> Result<PathBuf, ConfigError> {
    let path = config_path()?;
    let profiles = read_profiles(&path)?;

    if let Some(name) = profile {
        if !profiles.contains_key(name) {
            return Err(ConfigError::ProfileNotFound {
                name: name.to_string(),
                path,
            });
        }
    }

    Ok(path)
}

fn read_profiles(path: &Path) -> Result<HashMap<String, ProfileConfig>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ConfigFile = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    config.profiles.ok_or_else(|| ConfigError::NoProfiles {
        path: path.to_path_buf(),
    })
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = env_path(CONFIG_ENV) {
        return Ok(path);
    }

    if let Some(xdg) = env_path("XDG_CONFIG_HOME") {
        return Ok(xdg.join("seekgpt").join("config.toml"));
    }

    let home = env_path("HOME").ok_or(ConfigError::NoPath)?;
    Ok(home.join(".config").join("seekgpt").join("config.toml"))
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::{ConfigFile, ProfileConfig};
    use crate::client::FailurePolicy;

    #[test]
    fn profiles_parse_every_field() {
        let raw = r#"
            [profiles.work]
            base_url = "https://api.seekgpt.org/v1"
            model = "SeekGPT-mini"
            system = "Be brief."
            temperature = 0.2
            max_tokens = 256
            timeout = 30
            retries = 3
            retry_delay = 250
            failure_policy = "cache"
        "#;

        let config: ConfigFile = toml::from_str(raw).unwrap();
        let profiles = config.profiles.unwrap();
        let work = &profiles["work"];

        assert_eq!(work.model.as_deref(), Some("SeekGPT-mini"));
        assert_eq!(work.max_tokens, Some(256));
        assert_eq!(work.failure_policy, Some(FailurePolicy::Cache));
    }

    #[test]
    fn unknown_profile_keys_are_rejected() {
        let raw = r#"
            [profiles.bad]
            provider = "openai"
        "#;

        assert!(toml::from_str::<ConfigFile>(raw).is_err());
    }

    #[test]
    fn empty_profile_is_all_defaults() {
        let config: ConfigFile = toml::from_str("[profiles.empty]\n").unwrap();

        assert_eq!(config.profiles.unwrap()["empty"], ProfileConfig::default());
    }
}
