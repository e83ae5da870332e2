//! HTTP client for a single upstream provider
//!
//! One `UpstreamClient` exists per provider. All of them share the same
//! `reqwest::Client` (and therefore its connection pool and timeout).

use reqwest::Client;

use crate::config::Secret;
use crate::services::provider::{AuthScheme, Provider};
use crate::services::DispatchError;

/// Upper bound on how much of a failed upstream body is echoed back
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Credential and endpoint override for one provider
#[derive(Debug, Clone, Default)]
pub struct UpstreamConfig {
    pub api_key: Option<Secret>,
    /// Replaces the provider's default base URL when set
    pub base_url: Option<String>,
}

impl UpstreamConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(Secret::new(api_key)),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

pub struct UpstreamClient {
    provider: Provider,
    http: Client,
    base_url: String,
    api_key: Option<Secret>,
}

impl UpstreamClient {
    pub fn new(provider: Provider, http: Client, config: UpstreamConfig) -> Self {
        let base_url = config
            .base_url
            .unwrap_or_else(|| provider.profile().default_base_url.to_string());

        Self {
            provider,
            http,
            base_url,
            api_key: config.api_key,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Full URL the provider is called at
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.provider.profile().path
        )
    }

    /// Send `message` as a single user turn and return the reply text
    ///
    /// Makes exactly one HTTP call, or none when no credential is configured.
    pub async fn complete(&self, message: &str) -> Result<String, DispatchError> {
        let profile = self.provider.profile();

        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| self.failure(format!("{} is not configured", profile.credential_env)))?;

        let body = (profile.build_body)(profile, message)
            .map_err(|e| self.failure(format!("failed to encode request: {}", e)))?;

        let url = self.endpoint();

        tracing::debug!(
            provider = %self.provider,
            model = %profile.model,
            url = %url,
            "Calling upstream provider"
        );

        let request = self.http.post(&url).json(&body);
        let request = match profile.auth {
            AuthScheme::Bearer => request.bearer_auth(api_key.expose()),
            AuthScheme::XApiKey { version } => request
                .header("x-api-key", api_key.expose())
                .header("anthropic-version", version),
        };

        let response = request
            .send()
            .await
            .map_err(|e| self.failure(describe_transport_error(&e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.failure(describe_transport_error(&e)))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            return Err(self.failure(format!(
                "upstream returned {}: {}",
                status,
                truncate_chars(text.trim(), MAX_ERROR_BODY_CHARS)
            )));
        }

        (profile.extract_text)(&bytes)
            .map_err(|detail| self.failure(format!("unexpected response: {}", detail)))
    }

    fn failure(&self, detail: String) -> DispatchError {
        DispatchError::Upstream {
            provider: self.provider,
            detail,
        }
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else {
        format!("request failed: {}", err)
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::MockUpstream;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::time::Duration;

    fn client(provider: Provider, config: UpstreamConfig) -> UpstreamClient {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        UpstreamClient::new(provider, http, config)
    }

    #[test]
    fn test_default_endpoints() {
        let gpt = client(Provider::Gpt, UpstreamConfig::default());
        assert_eq!(gpt.endpoint(), "https://api.openai.com/v1/chat/completions");

        let claude = client(Provider::Claude, UpstreamConfig::default());
        assert_eq!(claude.endpoint(), "https://api.anthropic.com/v1/messages");

        let deepseek = client(Provider::Deepseek, UpstreamConfig::default());
        assert_eq!(deepseek.endpoint(), "https://api.deepseek.com/v1/chat/completions");
        assert!(!deepseek.is_configured());
    }

    #[test]
    fn test_base_url_override_trailing_slash() {
        let config = UpstreamConfig::new("k").with_base_url("http://localhost:9000/v1/");
        let gpt = client(Provider::Gpt, config);
        assert_eq!(gpt.endpoint(), "http://localhost:9000/v1/chat/completions");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello world", 5), "hello...");
        assert_eq!(truncate_chars("héllo", 2), "hé...");
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_call() {
        let mock = MockUpstream::json(StatusCode::OK, json!({})).await;
        let gpt = client(Provider::Gpt, UpstreamConfig::default().with_base_url(mock.base_url()));

        let err = gpt.complete("hello").await.unwrap_err();

        assert_eq!(err.to_string(), "gpt: OPENAI_API_KEY is not configured");
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn test_bearer_auth_request_shape() {
        let mock = MockUpstream::json(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": "hi there"}}]}),
        )
        .await;
        let deepseek = client(
            Provider::Deepseek,
            UpstreamConfig::new("ds-key").with_base_url(mock.base_url()),
        );

        let text = deepseek.complete("hello").await.unwrap();
        assert_eq!(text, "hi there");

        let captured = mock.last_request().expect("request captured");
        assert_eq!(captured.path, "/chat/completions");
        assert_eq!(captured.header("authorization"), Some("Bearer ds-key"));
        assert_eq!(captured.body["model"], "deepseek-chat");
        assert_eq!(captured.body["messages"][0]["role"], "user");
        assert_eq!(captured.body["messages"][0]["content"], "hello");
    }

    #[tokio::test]
    async fn test_anthropic_auth_request_shape() {
        let mock = MockUpstream::json(
            StatusCode::OK,
            json!({"content": [{"type": "text", "text": "hi there"}]}),
        )
        .await;
        let claude = client(
            Provider::Claude,
            UpstreamConfig::new("ant-key").with_base_url(mock.base_url()),
        );

        assert_eq!(claude.complete("hello").await.unwrap(), "hi there");

        let captured = mock.last_request().expect("request captured");
        assert_eq!(captured.path, "/messages");
        assert_eq!(captured.header("x-api-key"), Some("ant-key"));
        assert_eq!(captured.header("anthropic-version"), Some("2023-06-01"));
        assert_eq!(captured.header("authorization"), None);
        assert_eq!(captured.body["max_tokens"], 1024);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mock = MockUpstream::json(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"message": "Incorrect API key provided"}}),
        )
        .await;
        let gpt = client(Provider::Gpt, UpstreamConfig::new("bad").with_base_url(mock.base_url()));

        let err = gpt.complete("hello").await.unwrap_err();
        let message = err.to_string();

        assert!(message.starts_with("gpt: upstream returned 401 Unauthorized"), "{}", message);
        assert!(message.contains("Incorrect API key provided"));
        assert_eq!(mock.hits(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mock = MockUpstream::raw(StatusCode::OK, "<html>gateway</html>").await;
        let deepseek = client(
            Provider::Deepseek,
            UpstreamConfig::new("k").with_base_url(mock.base_url()),
        );

        let err = deepseek.complete("hello").await.unwrap_err();
        assert!(err.to_string().starts_with("deepseek: unexpected response:"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mock = MockUpstream::slow(Duration::from_secs(2)).await;
        let http = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let gpt = UpstreamClient::new(
            Provider::Gpt,
            http,
            UpstreamConfig::new("k").with_base_url(mock.base_url()),
        );

        let err = gpt.complete("hello").await.unwrap_err();
        assert!(err.to_string().contains("timed out"), "{}", err);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gpt = client(
            Provider::Gpt,
            UpstreamConfig::new("k").with_base_url(format!("http://{}", addr)),
        );

        let err = gpt.complete("hello").await.unwrap_err();
        assert!(err.to_string().starts_with("gpt: request failed:"), "{}", err);
    }
}
