//! Command implementations behind the `seekgpt` binary.

pub mod chat;
pub mod config;
pub mod models;

use std::env;

use crate::client::{BASE_URL_ENV, ClientBuilder, DEFAULT_BASE_URL};
use crate::config::ProfileConfig;

pub const MODEL_ENV: &str = "SEEKGPT_MODEL";

fn load_profile(name: Option<&str>) -> anyhow::Result<ProfileConfig> {
    match name {
        Some(name) => Ok(crate::config::load_profile(name)?),
        None => Ok(ProfileConfig::default()),
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// CLI flag, then environment, then profile, then the built-in default.
fn resolve_base_url(flag: Option<&str>, profile: &ProfileConfig) -> String {
    flag.map(str::to_string)
        .or_else(|| env_value(BASE_URL_ENV))
        .or_else(|| profile.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

fn client_builder(base_url: Option<&str>, profile: &ProfileConfig) -> ClientBuilder {
    crate::SeekGpt::builder()
        .base_url(resolve_base_url(base_url, profile))
        .profile(profile)
}
