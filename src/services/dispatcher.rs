//! Chat dispatcher
//!
//! Routes a validated [`ChatRequest`] to the client for its provider and
//! wraps the reply text in a [`ChatResponse`].

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use crate::config::Settings;
use crate::schemas::{ChatRequest, ChatResponse};
use crate::services::provider::Provider;
use crate::services::upstream::{UpstreamClient, UpstreamConfig};

/// Errors produced while validating or dispatching a chat request
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Inbound payload is missing a field or is not valid JSON
    #[error("{0}")]
    BadRequest(String),

    /// `model` names no known provider; carries the value that was sent
    #[error("Invalid model specified")]
    InvalidProvider(String),

    /// Anything that went wrong talking to the provider
    #[error("{provider}: {detail}")]
    Upstream { provider: Provider, detail: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Owns one upstream client per provider
pub struct Dispatcher {
    clients: HashMap<Provider, UpstreamClient>,
}

impl Dispatcher {
    /// Build a dispatcher whose upstream calls are bounded by `timeout`
    ///
    /// Providers absent from `upstreams` get a client with no credential,
    /// so requests to them fail without a network call.
    pub fn new(
        timeout: Duration,
        upstreams: impl IntoIterator<Item = (Provider, UpstreamConfig)>,
    ) -> Result<Self, DispatchError> {
        let http = Client::builder().timeout(timeout).build()?;

        let mut configs: HashMap<Provider, UpstreamConfig> = upstreams.into_iter().collect();
        let clients = Provider::ALL
            .into_iter()
            .map(|provider| {
                let config = configs.remove(&provider).unwrap_or_default();
                (provider, UpstreamClient::new(provider, http.clone(), config))
            })
            .collect();

        Ok(Self { clients })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, DispatchError> {
        let p = &settings.providers;
        let upstreams = [
            (
                Provider::Gpt,
                UpstreamConfig {
                    api_key: p.openai_api_key.clone(),
                    base_url: p.openai_base_url.clone(),
                },
            ),
            (
                Provider::Claude,
                UpstreamConfig {
                    api_key: p.anthropic_api_key.clone(),
                    base_url: p.anthropic_base_url.clone(),
                },
            ),
            (
                Provider::Deepseek,
                UpstreamConfig {
                    api_key: p.deepseek_api_key.clone(),
                    base_url: p.deepseek_base_url.clone(),
                },
            ),
        ];

        let dispatcher = Self::new(settings.upstream_timeout(), upstreams)?;

        for client in dispatcher.clients.values() {
            tracing::debug!(
                provider = %client.provider(),
                endpoint = %client.endpoint(),
                configured = client.is_configured(),
                "Registered upstream provider"
            );
        }

        Ok(dispatcher)
    }

    /// Forward the message to its provider and normalize the reply
    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatResponse, DispatchError> {
        let client = self
            .clients
            .get(&request.provider)
            .ok_or_else(|| DispatchError::Upstream {
                provider: request.provider,
                detail: "provider is not registered".to_string(),
            })?;

        tracing::debug!(
            provider = %request.provider,
            conversation_id = request.conversation_id.as_deref().unwrap_or("-"),
            message_chars = request.message.chars().count(),
            "Dispatching chat request"
        );

        match client.complete(&request.message).await {
            Ok(response) => Ok(ChatResponse { response }),
            Err(err) => {
                tracing::warn!(provider = %request.provider, error = %err, "Upstream call failed");
                Err(err)
            }
        }
    }

    pub fn configured_providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.clients.get(p).is_some_and(UpstreamClient::is_configured))
            .collect()
    }
}
