use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use tokio::time::sleep;

use crate::error::Error;

#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryConfig {
    pub timeout_secs: Option<u64>,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            retries: 2,
            retry_delay_ms: 500,
        }
    }
}

/// Authenticated HTTP access to the API root shared by every namespace.
#[derive(Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl Transport {
    pub(crate) fn new(base_url: impl Into<String>, api_key: String, retry: RetryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            retry,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) async fn get(&self, path: &str) -> Result<reqwest::Response, Error> {
        self.send(Method::GET, path, None::<&()>).await
    }

    pub(crate) async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<reqwest::Response, Error> {
        self.send(Method::POST, path, Some(payload)).await
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&T>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path);
        let max_attempts = self.retry.retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&self.api_key);
            if let Some(payload) = payload {
                request = request.json(payload);
            }
            if let Some(timeout_secs) = self.retry.timeout_secs {
                request = request.timeout(Duration::from_secs(timeout_secs));
            }

            tracing::debug!(%method, %url, attempt, "sending request");

            match request.send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();

                    if is_retryable_status(status) && attempt + 1 < max_attempts {
                        tracing::warn!(%status, attempt, "retrying after API error");
                        sleep(retry_delay(attempt, self.retry.retry_delay_ms)).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(Error::Api { status, body });
                }
                Err(source) => {
                    if is_retryable_request_error(&source) && attempt + 1 < max_attempts {
                        tracing::warn!(error = %source, attempt, "retrying after request failure");
                        sleep(retry_delay(attempt, self.retry.retry_delay_ms)).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(Error::Request { url, source });
                }
            }
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_request_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

fn retry_delay(attempt: u32, base_ms: u64) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let delay_ms = base_ms.saturating_mul(factor).min(30_000);
    Duration::from_millis(delay_ms)
}

#[cfg(test)]
mod tests {
    use super::{RetryConfig, Transport, is_retryable_status, retry_delay};
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn retry_delay_doubles_per_attempt() {
        assert_eq!(retry_delay(0, 250), Duration::from_millis(250));
        assert_eq!(retry_delay(1, 250), Duration::from_millis(500));
        assert_eq!(retry_delay(3, 250), Duration::from_millis(2_000));
    }

    #[test]
    fn retry_delay_is_capped() {
        assert_eq!(retry_delay(12, 500), Duration::from_millis(30_000));
        assert_eq!(retry_delay(64, 1), Duration::from_millis(30_000));
    }

    #[test]
    fn rate_limits_and_server_errors_are_retried() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));

        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
    }

    #[test]
    fn urls_join_base_and_path_with_one_slash() {
        let transport = Transport::new(
            "https://api.seekgpt.org/v1/",
            "sk-test".to_string(),
            RetryConfig::default(),
        );

        assert_eq!(transport.base_url(), "https://api.seekgpt.org/v1");
        assert_eq!(
            transport.url("/chat/completions"),
            "https://api.seekgpt.org/v1/chat/completions"
        );
        assert_eq!(transport.url("models"), "https://api.seekgpt.org/v1/models");
    }
}
