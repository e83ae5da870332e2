//! Health check endpoints

use axum::Json;

use crate::error::ApiError;
use crate::schemas::StatusResponse;

/// Liveness endpoint for the hosting platform
///
/// Never consults the upstream providers.
///
/// GET /api/health
pub async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse::new("healthy"))
}

/// Fallback for unknown paths
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
