use std::env;
use std::sync::Arc;

use serde::Deserialize;

use crate::config::ProfileConfig;
use crate::error::{Error, LoadError};
use crate::modules::{ModuleLoader, Namespace, Registry};
use crate::proxy::{LazyProxy, Loader, Sticky};
use crate::resources::{Models, Resources};
use crate::streaming::Streaming;
use crate::transport::{RetryConfig, Transport};
use crate::types::{ChatCompletion, ChatMessage, ChatRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.seekgpt.org/v1";
pub const BASE_URL_ENV: &str = "SEEKGPT_BASE_URL";

/// Checked in order when no key is passed explicitly.
pub const API_KEY_ENVS: &[&str] = &["SEEKGPT_API_KEY", "OPENAI_API_KEY", "ANYSCALE_API_KEY"];

/// What a namespace proxy does after a failed load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Run the loader again on the next access.
    #[default]
    Retry,
    /// Keep returning the first failure.
    Cache,
}

type NamespaceLoader<N> = Box<dyn Loader<Output = N, Error = LoadError> + Send + Sync>;

fn namespace_proxy<N>(
    registry: Registry,
    transport: &Arc<Transport>,
    policy: FailurePolicy,
) -> LazyProxy<NamespaceLoader<N>>
where
    N: Namespace<Deps = Arc<Transport>> + Send + Sync + 'static,
{
    let loader = ModuleLoader::<N>::new(registry, Arc::clone(transport));
    let loader: NamespaceLoader<N> = match policy {
        FailurePolicy::Retry => Box::new(loader),
        FailurePolicy::Cache => Box::new(Sticky::new(loader)),
    };
    LazyProxy::new(loader)
}

fn resolve_namespace<N: Namespace>(proxy: &LazyProxy<NamespaceLoader<N>>) -> Result<&N, Error> {
    let first_access = !proxy.is_loaded();
    match proxy.resolve() {
        Ok(namespace) => {
            if first_access {
                tracing::debug!(module = N::PATH, "namespace loaded");
            }
            Ok(namespace)
        }
        Err(err) => {
            tracing::debug!(module = N::PATH, error = ?err, "namespace unavailable");
            Err(err.into())
        }
    }
}

/// SeekGPT API client.
///
/// Constructing a client is cheap: the `resources` and `streaming` namespaces
/// are only materialized the first time they are used.
pub struct SeekGpt {
    transport: Arc<Transport>,
    default_model: Option<String>,
    resources: LazyProxy<NamespaceLoader<Resources>>,
    streaming: LazyProxy<NamespaceLoader<Streaming>>,
}

impl SeekGpt {
    /// Client configured entirely from the environment.
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    pub fn resources(&self) -> Result<&Resources, Error> {
        resolve_namespace(&self.resources)
    }

    pub fn resources_loaded(&self) -> bool {
        self.resources.is_loaded()
    }

    /// Streaming namespace; fails unless built with the `streaming` extra.
    pub fn streaming(&self) -> Result<&Streaming, Error> {
        resolve_namespace(&self.streaming)
    }

    pub fn models(&self) -> Result<&Models, Error> {
        Ok(&self.resources()?.models)
    }

    /// Sends `messages` to the client's default model.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<ChatCompletion, Error> {
        let model = self.default_model.clone().ok_or(Error::MissingModel)?;
        self.chat_with(&ChatRequest::new(model, messages)).await
    }

    pub async fn chat_with(&self, request: &ChatRequest) -> Result<ChatCompletion, Error> {
        self.resources()?.chat.create(request).await
    }
}

impl std::fmt::Debug for SeekGpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeekGpt")
            .field("base_url", &self.transport.base_url())
            .field("default_model", &self.default_model)
            .field("resources_loaded", &self.resources.is_loaded())
            .field("streaming_loaded", &self.streaming.is_loaded())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    default_model: Option<String>,
    timeout_secs: Option<u64>,
    retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    failure_policy: Option<FailurePolicy>,
    registry: Registry,
}

impl ClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = Some(retry_delay_ms);
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    /// Module table used to resolve the client's namespaces.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Fills every option the builder does not set yet from `profile`.
    pub fn profile(mut self, profile: &ProfileConfig) -> Self {
        self.base_url = self.base_url.or_else(|| profile.base_url.clone());
        self.default_model = self.default_model.or_else(|| profile.model.clone());
        self.timeout_secs = self.timeout_secs.or(profile.timeout);
        self.retries = self.retries.or(profile.retries);
        self.retry_delay_ms = self.retry_delay_ms.or(profile.retry_delay);
        self.failure_policy = self.failure_policy.or(profile.failure_policy);
        self
    }

    pub fn build(self) -> Result<SeekGpt, Error> {
        let api_key = match self.api_key {
            Some(api_key) => api_key,
            None => api_key_from_env().ok_or(Error::MissingApiKey {
                key_envs: API_KEY_ENVS,
            })?,
        };
        let base_url = self
            .base_url
            .or_else(|| non_empty_env(BASE_URL_ENV))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let defaults = RetryConfig::default();
        let retry = RetryConfig {
            timeout_secs: self.timeout_secs,
            retries: self.retries.unwrap_or(defaults.retries),
            retry_delay_ms: self.retry_delay_ms.unwrap_or(defaults.retry_delay_ms),
        };
        let policy = self.failure_policy.unwrap_or_default();
        let transport = Arc::new(Transport::new(base_url, api_key, retry));
        tracing::debug!(base_url = transport.base_url(), ?policy, "client configured");

        Ok(SeekGpt {
            resources: namespace_proxy(self.registry, &transport, policy),
            streaming: namespace_proxy(self.registry, &transport, policy),
            default_model: self.default_model,
            transport,
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// First non-empty key among [`API_KEY_ENVS`].
pub fn api_key_from_env() -> Option<String> {
    API_KEY_ENVS.iter().find_map(|key| non_empty_env(key))
}
