//! Chat endpoint
//!
//! `POST /api/chat` forwards a message to the provider named in `model`.
//! `OPTIONS` answers CORS preflight; every other method is rejected. The
//! CORS headers themselves are attached by the router.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};

use crate::error::ApiError;
use crate::schemas::{ChatPayload, ChatRequest, ChatResponse, StatusResponse};
use crate::server::state::AppState;

/// POST /api/chat
///
/// The body is read as raw bytes so that malformed JSON and missing fields
/// both come back as `400 {error}` rather than an extractor rejection.
/// Bodies over the default 2 MiB limit are answered `413 {error}`.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let body = body?;
    let payload: ChatPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    let request = ChatRequest::try_from(payload)?;

    let response = state.dispatcher.handle(&request).await?;

    Ok(Json(response))
}

/// OPTIONS /api/chat
pub async fn preflight() -> Json<StatusResponse> {
    Json(StatusResponse::new("ok"))
}

/// Any other method on /api/chat
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
