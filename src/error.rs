use reqwest::StatusCode;
use thiserror::Error;

use crate::extras::MissingDependencyError;

/// Failure to materialize a lazily loaded namespace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    MissingDependency(#[from] MissingDependencyError),

    #[error("module `{0}` is not part of this build")]
    ModuleNotFound(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("no API key found: set one of {}", .key_envs.join(", "))]
    MissingApiKey { key_envs: &'static [&'static str] },

    #[error("no model provided and the client has no default model")]
    MissingModel,

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("response did not contain message content")]
    EmptyResponse,

    #[error("invalid stream event: {0}")]
    Stream(String),

    #[cfg(feature = "codecs")]
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Returns the missing-extra error when this failure is one.
    pub fn missing_dependency(&self) -> Option<&MissingDependencyError> {
        match self {
            Self::Load(LoadError::MissingDependency(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<MissingDependencyError> for Error {
    fn from(err: MissingDependencyError) -> Self {
        Self::Load(LoadError::MissingDependency(err))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::{Error, LoadError};
    use crate::extras::MissingDependencyError;

    #[test]
    fn missing_dependency_is_distinguishable_by_type() {
        let err = Error::from(MissingDependencyError::new("image", "codecs"));

        let missing = err.missing_dependency().expect("typed missing dependency");
        assert_eq!(missing.library, "image");
        assert_eq!(missing.extra, "codecs");
    }

    #[test]
    fn other_load_failures_are_not_missing_dependencies() {
        let err = Error::from(LoadError::ModuleNotFound("seekgpt.nope".to_string()));

        assert!(err.missing_dependency().is_none());
        assert_eq!(err.to_string(), "module `seekgpt.nope` is not part of this build");
    }

    #[test]
    fn missing_api_key_lists_every_variable() {
        let err = Error::MissingApiKey {
            key_envs: &["A_KEY", "B_KEY"],
        };

        assert_eq!(err.to_string(), "no API key found: set one of A_KEY, B_KEY");
    }
}
