//! CORS origin handling
//!
//! `CORS_ALLOW_ORIGIN` is either `*`, a single origin sent on every
//! response, or a comma-separated allow-list. With a list, the request's
//! `Origin` is reflected only when it is listed.

use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Origins allowed to read chat responses
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorsOrigins {
    /// `*`
    Any,
    /// One origin, sent regardless of the request
    Exact(HeaderValue),
    /// Several origins; the matching request origin is echoed back
    List(Vec<HeaderValue>),
}

impl CorsOrigins {
    /// Parse a `CORS_ALLOW_ORIGIN` value
    pub fn parse(value: &str) -> Result<Self> {
        let origins: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .collect();

        if origins.is_empty() {
            anyhow::bail!("CORS_ALLOW_ORIGIN is empty");
        }
        if origins.contains(&"*") {
            return Ok(Self::Any);
        }

        let mut values = origins
            .into_iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("Invalid CORS_ALLOW_ORIGIN entry: {:?}", origin))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(match values.len() {
            1 => Self::Exact(values.remove(0)),
            _ => Self::List(values),
        })
    }

    /// The `Access-Control-Allow-Origin` value for a request carrying `origin`
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        match self {
            Self::Any => Some(HeaderValue::from_static("*")),
            Self::Exact(value) => Some(value.clone()),
            Self::List(allowed) => origin.filter(|o| allowed.contains(o)).cloned(),
        }
    }

    /// Whether the response depends on the request's `Origin`
    pub fn varies_by_origin(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

/// Middleware setting `Access-Control-Allow-Origin` on every response it wraps
///
/// A listed-origin policy omits the header for unlisted origins and adds
/// `Vary: Origin` so caches keep the variants apart.
pub async fn apply_cors(
    State(origins): State<Arc<CorsOrigins>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    match origins.allow_origin(origin.as_ref()) {
        Some(value) => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        None => {
            if let Some(origin) = origin {
                tracing::debug!(origin = ?origin, "Origin not in CORS allow-list");
            }
            headers.remove(header::ACCESS_CONTROL_ALLOW_ORIGIN);
        }
    }

    if origins.varies_by_origin() {
        headers.append(header::VARY, HeaderValue::from_static("origin"));
    }

    response
}
