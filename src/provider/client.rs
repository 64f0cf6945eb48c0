//! Generic provider executor
//!
//! One client drives every provider in the profile table: it attaches the
//! profile's auth headers, posts the profile's body shape, classifies error
//! envelopes, extracts the generated text by JSON path, and polls
//! asynchronous providers to completion. A process-wide fixed-window rate
//! limit is enforced before any network call.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{header::HeaderMap, Client, RequestBuilder};
use serde_json::Value;

use super::error::ProviderError;
use super::profile::{self, AuthStyle, CompletionMode, ProviderProfile};
use crate::models::GeneratedText;

/// Default request budget shared across all provider calls
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 20;

/// Single network call timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Fixed interval between poll attempts for asynchronous providers
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Maximum poll attempts before giving up
const MAX_POLL_ATTEMPTS: u32 = 30;

/// Canned prompt used by connection tests
const TEST_PROMPT: &str = "Test connection. Respond with: Connection successful.";

/// HTTP client for text-generation providers
pub struct ProviderClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Optional base URL override for testing with mock servers; replaces
    /// the scheme and host of every profile endpoint
    base_url: Option<String>,

    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl ProviderClient {
    /// Create a client with the default 20 requests/minute budget
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_limit(DEFAULT_REQUESTS_PER_MINUTE)
    }

    /// Create a client with a custom per-minute request budget
    pub fn with_limit(requests_per_minute: u32) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .gzip(true)
            .build()?;

        let rate = NonZeroU32::new(requests_per_minute)
            .unwrap_or_else(|| NonZeroU32::new(1).expect("1 is non-zero"));
        let rate_limiter = RateLimiter::direct(Quota::per_minute(rate));

        Ok(Self {
            client,
            rate_limiter,
            base_url: None,
            poll_interval: POLL_INTERVAL,
            max_poll_attempts: MAX_POLL_ATTEMPTS,
        })
    }

    /// Create a client pointed at a mock server
    pub fn with_base_url(base_url: &str, requests_per_minute: u32) -> Result<Self, ProviderError> {
        let mut client = Self::with_limit(requests_per_minute)?;
        client.base_url = Some(base_url.trim_end_matches('/').to_string());
        client.poll_interval = Duration::from_millis(10);
        Ok(client)
    }

    /// Generate text via the named provider
    ///
    /// The prompt is expected to be fully placeholder-substituted by the
    /// caller. The rate-limit check happens before any network traffic; an
    /// exhausted budget aborts immediately without retry.
    pub async fn generate(
        &self,
        provider: &str,
        api_key: &str,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<GeneratedText, ProviderError> {
        let profile = profile::lookup(provider)
            .ok_or_else(|| ProviderError::UnknownProvider(provider.to_string()))?;

        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        self.rate_limiter
            .check()
            .map_err(|_| ProviderError::RateLimited)?;

        let url = self.resolve_url(profile.endpoint);
        let body = profile.build_body(prompt, model);

        tracing::debug!(provider = %profile.name, url = %url, "Sending generation request");

        let request = self
            .client
            .post(&url)
            .headers(Self::build_headers(profile, api_key));
        let request = Self::apply_query_auth(request, profile, api_key);

        let response = request.json(&body).send().await?;
        let status = response.status();
        let payload: Value = match response.json().await {
            Ok(value) => value,
            Err(_) if !status.is_success() => Value::Null,
            Err(e) => return Err(ProviderError::Transport(e)),
        };

        if !status.is_success() {
            return Err(Self::classify_rejection(status.as_u16(), &payload));
        }

        match profile.completion {
            CompletionMode::Immediate => Self::extract_text(profile, &payload),
            CompletionMode::Polled => self.poll_to_completion(profile, api_key, &payload).await,
        }
    }

    /// Send a canned prompt and return the provider's model catalog
    pub async fn test_connection(
        &self,
        provider: &str,
        api_key: &str,
    ) -> Result<Vec<&'static str>, ProviderError> {
        let profile = profile::lookup(provider)
            .ok_or_else(|| ProviderError::UnknownProvider(provider.to_string()))?;

        let result = self.generate(provider, api_key, TEST_PROMPT, None).await?;
        tracing::info!(
            provider = %provider,
            response_length = result.content.len(),
            "Provider connection test successful"
        );

        Ok(profile.models.to_vec())
    }

    /// Poll an asynchronous prediction until it succeeds, fails, or the
    /// attempt budget is exhausted
    ///
    /// The loop is bounded and yields at every await point, so a caller
    /// dropping the future cancels it cleanly.
    async fn poll_to_completion(
        &self,
        profile: &ProviderProfile,
        api_key: &str,
        created: &Value,
    ) -> Result<GeneratedText, ProviderError> {
        let poll_url = created
            .get("urls")
            .and_then(|u| u.get("get"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                created
                    .get("id")
                    .and_then(Value::as_str)
                    .map(|id| format!("{}/{id}", self.resolve_url(profile.endpoint)))
            })
            .ok_or_else(|| ProviderError::Unparseable {
                path: "urls.get".to_string(),
            })?;

        for attempt in 1..=self.max_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(&poll_url)
                .headers(Self::build_headers(profile, api_key))
                .send()
                .await?;
            let payload: Value = response.json().await?;

            let state = payload
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("unknown");

            match state {
                "succeeded" => return Self::extract_text(profile, &payload),
                "failed" | "canceled" => {
                    let detail = payload
                        .get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("prediction failed")
                        .to_string();
                    return Err(ProviderError::Failed(detail));
                }
                _ => {
                    tracing::debug!(
                        provider = %profile.name,
                        attempt,
                        state,
                        "Prediction still running"
                    );
                }
            }
        }

        Err(ProviderError::Timeout)
    }

    /// Extract the generated text and usage from a response payload
    fn extract_text(
        profile: &ProviderProfile,
        payload: &Value,
    ) -> Result<GeneratedText, ProviderError> {
        let node = profile::json_path(payload, profile.content_path).ok_or_else(|| {
            ProviderError::Unparseable {
                path: profile.content_path.to_string(),
            }
        })?;

        // Asynchronous providers stream output as an array of chunks
        let content = match node {
            Value::String(s) => s.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(""),
            _ => {
                return Err(ProviderError::Unparseable {
                    path: profile.content_path.to_string(),
                })
            }
        };

        let usage = profile
            .usage_path
            .and_then(|path| profile::json_path(payload, path))
            .cloned();

        Ok(GeneratedText { content, usage })
    }

    /// Classify a non-success response by probing known error envelopes
    fn classify_rejection(status: u16, payload: &Value) -> ProviderError {
        let message = payload
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .or_else(|| payload.get("error").and_then(Value::as_str))
            .or_else(|| payload.get("message").and_then(Value::as_str))
            .or_else(|| payload.get("detail").and_then(Value::as_str))
            .unwrap_or("Unknown API error")
            .to_string();

        ProviderError::Rejected { status, message }
    }

    /// Build auth and content headers for a profile
    fn build_headers(profile: &ProviderProfile, api_key: &str) -> HeaderMap {
        use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("postgen/", env!("CARGO_PKG_VERSION"))),
        );

        let auth_value = match profile.auth {
            AuthStyle::Bearer => Some(format!("Bearer {api_key}")),
            AuthStyle::Token => Some(format!("Token {api_key}")),
            AuthStyle::AnthropicApiKey | AuthStyle::QueryParam => None,
        };
        if let Some(value) = auth_value {
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        if profile.auth == AuthStyle::AnthropicApiKey {
            if let Ok(value) = HeaderValue::from_str(api_key) {
                headers.insert("x-api-key", value);
            }
            headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        }

        headers
    }

    /// Attach query-parameter auth where the profile requires it
    fn apply_query_auth(
        request: RequestBuilder,
        profile: &ProviderProfile,
        api_key: &str,
    ) -> RequestBuilder {
        if profile.auth == AuthStyle::QueryParam {
            request.query(&[("key", api_key)])
        } else {
            request
        }
    }

    /// Resolve a profile endpoint, honoring the test base URL override
    fn resolve_url(&self, endpoint: &str) -> String {
        match &self.base_url {
            Some(base) => {
                let path = endpoint
                    .find("://")
                    .and_then(|i| endpoint[i + 3..].find('/').map(|j| &endpoint[i + 3 + j..]))
                    .unwrap_or("/");
                format!("{base}{path}")
            }
            None => endpoint.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url_without_override() {
        let client = ProviderClient::new().unwrap();
        assert_eq!(
            client.resolve_url("https://api.openai.com/v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_resolve_url_with_override() {
        let client = ProviderClient::with_base_url("http://localhost:9999", 100).unwrap();
        assert_eq!(
            client.resolve_url("https://api.openai.com/v1/chat/completions"),
            "http://localhost:9999/v1/chat/completions"
        );
    }

    #[test]
    fn test_classify_rejection_envelopes() {
        let nested = serde_json::json!({ "error": { "message": "bad key" } });
        match ProviderClient::classify_rejection(401, &nested) {
            ProviderError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected: {other:?}"),
        }

        let flat = serde_json::json!({ "error": "quota exceeded" });
        match ProviderClient::classify_rejection(429, &flat) {
            ProviderError::Rejected { message, .. } => assert_eq!(message, "quota exceeded"),
            other => panic!("unexpected: {other:?}"),
        }

        let detail = serde_json::json!({ "detail": "not found" });
        match ProviderClient::classify_rejection(404, &detail) {
            ProviderError::Rejected { message, .. } => assert_eq!(message, "not found"),
            other => panic!("unexpected: {other:?}"),
        }

        match ProviderClient::classify_rejection(500, &Value::Null) {
            ProviderError::Rejected { message, .. } => {
                assert_eq!(message, "Unknown API error")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion() {
        let client = ProviderClient::with_limit(1).unwrap();

        // First check consumes the budget, second must abort locally
        // without reaching the network.
        client.rate_limiter.check().unwrap();
        let result = client.generate("openai", "key", "prompt", None).await;
        assert!(matches!(result, Err(ProviderError::RateLimited)));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_an_error() {
        let client = ProviderClient::new().unwrap();
        let result = client.generate("llamacloud", "key", "prompt", None).await;
        assert!(matches!(result, Err(ProviderError::UnknownProvider(_))));
    }

    #[tokio::test]
    async fn test_empty_api_key_rejected() {
        let client = ProviderClient::new().unwrap();
        let result = client.generate("openai", "", "prompt", None).await;
        assert!(matches!(result, Err(ProviderError::MissingApiKey)));
    }
}
