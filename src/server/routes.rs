//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::{chat, health};
use crate::middleware::{cors::apply_cors, logging::log_request};
use crate::server::state::AppState;

/// Methods advertised on chat responses
const CORS_ALLOW_METHODS: &str = "POST, OPTIONS";

/// Request headers advertised on chat responses
const CORS_ALLOW_HEADERS: &str = "Content-Type";

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Chat routes and the 404 fallback carry the CORS headers on every
    // response, including preflight and 405s
    let cors_routes = Router::new()
        .route(
            "/api/chat",
            post(chat::chat)
                .options(chat::preflight)
                .fallback(chat::method_not_allowed),
        )
        .fallback(health::not_found)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ))
        .layer(middleware::from_fn_with_state(
            state.cors_origins.clone(),
            apply_cors,
        ));

    Router::new()
        .merge(cors_routes)
        .route("/api/health", get(health::health_check))
        // Custom request logging with trace IDs
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
