//! Application state container
//!
//! This module defines the shared application state that is passed
//! to all request handlers via Axum's state extraction.

use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::middleware::cors::CorsOrigins;
use crate::services::Dispatcher;

/// Shared application state
///
/// Cheap to clone; everything behind it is read-only for the life of the
/// process.
#[derive(Clone)]
pub struct AppState {
    /// Routes chat requests to the upstream providers
    pub dispatcher: Arc<Dispatcher>,

    /// Origins allowed by the chat routes
    pub cors_origins: Arc<CorsOrigins>,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state, building the dispatcher from settings
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        tracing::debug!(
            timeout_seconds = settings.upstream_timeout_seconds,
            "Creating upstream dispatcher"
        );
        let dispatcher =
            Dispatcher::from_settings(settings).context("Failed to create dispatcher")?;

        Self::with_dispatcher(settings, dispatcher)
    }

    /// Create a state around an already-built dispatcher
    pub fn with_dispatcher(settings: &Settings, dispatcher: Dispatcher) -> anyhow::Result<Self> {
        let cors_origins = settings.cors_origins()?;

        tracing::info!(
            configured_providers = ?dispatcher.configured_providers(),
            cors_origins = %settings.cors_allow_origin,
            "Application state initialized successfully"
        );

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            cors_origins: Arc::new(cors_origins),
            start_time: Instant::now(),
        })
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
