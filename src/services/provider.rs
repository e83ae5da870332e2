//! Provider strategy table
//!
//! Each supported provider is described by a static [`ProviderProfile`]:
//! where to send the call, how to authenticate, how to shape the request
//! body and where the reply text lives in the response. The dispatcher
//! never branches on the provider itself.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::schemas::anthropic::{MessageRequest, MessageResponse};
use crate::schemas::openai::{ChatCompletionRequest, ChatCompletionResponse};
use crate::services::DispatchError;

/// Token cap sent with every Anthropic messages call
pub const CLAUDE_MAX_TOKENS: u32 = 1024;

/// Anthropic API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Known upstream providers, keyed by the `model` field of a chat request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Gpt,
    Claude,
    Deepseek,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Gpt, Provider::Claude, Provider::Deepseek];

    /// Identifier as it appears in requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gpt => "gpt",
            Provider::Claude => "claude",
            Provider::Deepseek => "deepseek",
        }
    }

    pub fn profile(&self) -> &'static ProviderProfile {
        match self {
            Provider::Gpt => &OPENAI,
            Provider::Claude => &ANTHROPIC,
            Provider::Deepseek => &DEEPSEEK,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DispatchError::InvalidProvider(s.to_string()))
    }
}

/// How the credential is attached to an upstream request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `x-api-key: <key>` plus `anthropic-version`
    XApiKey { version: &'static str },
}

/// Everything needed to call one provider and read its reply
pub struct ProviderProfile {
    /// Environment variable holding the credential
    pub credential_env: &'static str,
    pub default_base_url: &'static str,
    /// Appended to the base URL
    pub path: &'static str,
    pub model: &'static str,
    pub auth: AuthScheme,
    pub build_body: fn(&ProviderProfile, &str) -> serde_json::Result<Value>,
    /// Pulls the reply text out of a successful response body
    pub extract_text: fn(&[u8]) -> Result<String, String>,
}

static OPENAI: ProviderProfile = ProviderProfile {
    credential_env: "OPENAI_API_KEY",
    default_base_url: "https://api.openai.com/v1",
    path: "/chat/completions",
    model: "gpt-3.5-turbo",
    auth: AuthScheme::Bearer,
    build_body: chat_completion_body,
    extract_text: chat_completion_text,
};

static ANTHROPIC: ProviderProfile = ProviderProfile {
    credential_env: "ANTHROPIC_API_KEY",
    default_base_url: "https://api.anthropic.com/v1",
    path: "/messages",
    model: "claude-3-sonnet-20240229",
    auth: AuthScheme::XApiKey {
        version: ANTHROPIC_VERSION,
    },
    build_body: messages_body,
    extract_text: messages_text,
};

static DEEPSEEK: ProviderProfile = ProviderProfile {
    credential_env: "DEEPSEEK_API_KEY",
    default_base_url: "https://api.deepseek.com/v1",
    path: "/chat/completions",
    model: "deepseek-chat",
    auth: AuthScheme::Bearer,
    build_body: chat_completion_body,
    extract_text: chat_completion_text,
};

fn chat_completion_body(profile: &ProviderProfile, message: &str) -> serde_json::Result<Value> {
    serde_json::to_value(ChatCompletionRequest::single_user(profile.model, message))
}

fn chat_completion_text(body: &[u8]) -> Result<String, String> {
    let response: ChatCompletionResponse =
        serde_json::from_slice(body).map_err(|e| e.to_string())?;
    response
        .first_text()
        .map(str::to_string)
        .ok_or_else(|| "no message content in first choice".to_string())
}

fn messages_body(profile: &ProviderProfile, message: &str) -> serde_json::Result<Value> {
    serde_json::to_value(MessageRequest::single_user(
        profile.model,
        CLAUDE_MAX_TOKENS,
        message,
    ))
}

fn messages_text(body: &[u8]) -> Result<String, String> {
    let response: MessageResponse = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    response
        .first_text()
        .map(str::to_string)
        .ok_or_else(|| "first content block is not text".to_string())
}
