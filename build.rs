use std::env;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const EXTRAS: &[&str] = &["streaming", "codecs"];

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    println!("cargo:rustc-env=SEEKGPT_GIT_SHA={}", git_sha());
    println!("cargo:rustc-env=SEEKGPT_BUILD_TS={}", build_timestamp());
    println!("cargo:rustc-env=SEEKGPT_EXTRAS={}", enabled_extras());
}

fn git_sha() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn build_timestamp() -> String {
    env::var("SOURCE_DATE_EPOCH").unwrap_or_else(|_| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string()
    })
}

// Cargo exposes each active feature as CARGO_FEATURE_<NAME>.
fn enabled_extras() -> String {
    let enabled = EXTRAS
        .iter()
        .filter(|extra| env::var_os(format!("CARGO_FEATURE_{}", extra.to_uppercase())).is_some())
        .copied()
        .collect::<Vec<_>>();

    if enabled.is_empty() {
        "none".to_string()
    } else {
        enabled.join(",")
    }
}
