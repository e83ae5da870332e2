//! Inbound chat endpoint types
//!
//! `ChatPayload` is what arrives on the wire; `ChatRequest` is the validated
//! form the dispatcher accepts.

use serde::{Deserialize, Serialize};

use crate::services::{DispatchError, Provider};

/// Raw `POST /api/chat` body
///
/// Every field is optional so presence is checked here rather than by the
/// JSON extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub message: Option<String>,

    /// Provider identifier: "gpt", "claude" or "deepseek"
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// A chat request that passed presence checks and names a known provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub provider: Provider,
    /// Accepted for forward compatibility; not sent upstream
    pub conversation_id: Option<String>,
}

impl TryFrom<ChatPayload> for ChatRequest {
    type Error = DispatchError;

    fn try_from(payload: ChatPayload) -> Result<Self, Self::Error> {
        let message = payload.message.filter(|m| !m.is_empty());
        let model = payload.model.filter(|m| !m.is_empty());

        let (Some(message), Some(model)) = (message, model) else {
            return Err(DispatchError::BadRequest("Missing message or model".to_string()));
        };

        Ok(Self {
            message,
            provider: model.parse()?,
            conversation_id: payload.conversation_id,
        })
    }
}

/// Successful chat reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Error body shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `{status}` body used by health and preflight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self { status: status.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(message: Option<&str>, model: Option<&str>) -> ChatPayload {
        ChatPayload {
            message: message.map(str::to_string),
            model: model.map(str::to_string),
            conversation_id: None,
        }
    }

    #[test]
    fn test_valid_payload() {
        let json = r#"{"message": "hello", "model": "claude", "conversation_id": "c-1"}"#;
        let payload: ChatPayload = serde_json::from_str(json).unwrap();
        let request = ChatRequest::try_from(payload).unwrap();

        assert_eq!(request.message, "hello");
        assert_eq!(request.provider, Provider::Claude);
        assert_eq!(request.conversation_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn test_missing_fields_are_bad_request() {
        for p in [
            payload(None, Some("gpt")),
            payload(Some("hello"), None),
            payload(Some(""), Some("gpt")),
            payload(Some("hello"), Some("")),
            ChatPayload::default(),
        ] {
            let err = ChatRequest::try_from(p).unwrap_err();
            assert!(matches!(err, DispatchError::BadRequest(_)), "got {:?}", err);
        }
    }

    #[test]
    fn test_unknown_model_is_invalid_provider() {
        let err = ChatRequest::try_from(payload(Some("hello"), Some("llama"))).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidProvider(ref m) if m == "llama"));
        assert_eq!(err.to_string(), "Invalid model specified");
    }

    #[test]
    fn test_chat_response_shape() {
        let json = serde_json::to_value(ChatResponse { response: "hi".to_string() }).unwrap();
        assert_eq!(json, serde_json::json!({"response": "hi"}));
    }
}
