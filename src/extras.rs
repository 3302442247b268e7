//! Remediation text for optional extras that are not compiled in.
//!
//! Every extra is a cargo feature of this crate. When a namespace backed by an
//! extra is requested from a build without it, the caller receives a
//! [`MissingDependencyError`] whose message tells them which feature to enable.

use thiserror::Error;

/// Renders the install instructions for `library`, provided by the `extra` feature.
pub fn format_instructions(library: &str, extra: &str) -> String {
    format!(
        "\n\nSeekGPT error:\n\n    missing `{library}`\n\n\
         This feature requires additional dependencies:\n\n    \
         $ cargo add seekgpt --features {extra}\n\n"
    )
}

/// An optional extra's backing library is not part of this build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", format_instructions(.library, .extra))]
pub struct MissingDependencyError {
    /// Library that could not be resolved.
    pub library: String,
    /// Feature that provides the library.
    pub extra: String,
}

impl MissingDependencyError {
    pub fn new(library: impl Into<String>, extra: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            extra: extra.into(),
        }
    }

    /// Full remediation message, identical to the `Display` output.
    pub fn instructions(&self) -> String {
        format_instructions(&self.library, &self.extra)
    }
}
