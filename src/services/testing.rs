//! In-process stand-in for an upstream provider, for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use serde_json::Value;

/// What the mock saw on its most recent call
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Answers every request on any path with a fixed reply
pub struct MockUpstream {
    addr: std::net::SocketAddr,
    hits: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<CapturedRequest>>>,
}

impl MockUpstream {
    pub async fn json(status: StatusCode, body: Value) -> Self {
        Self::spawn(status, body.to_string(), Duration::ZERO).await
    }

    pub async fn raw(status: StatusCode, body: &str) -> Self {
        Self::spawn(status, body.to_string(), Duration::ZERO).await
    }

    /// Replies 200 with an empty choice list, but only after `delay`
    pub async fn slow(delay: Duration) -> Self {
        Self::spawn(StatusCode::OK, r#"{"choices":[]}"#.to_string(), delay).await
    }

    async fn spawn(status: StatusCode, body: String, delay: Duration) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None));

        let handler = {
            let hits = hits.clone();
            let last = last.clone();
            move |uri: Uri, headers: HeaderMap, request_body: Bytes| {
                let hits = hits.clone();
                let last = last.clone();
                let body = body.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    *last.lock().unwrap() = Some(CapturedRequest {
                        path: uri.path().to_string(),
                        headers,
                        body: serde_json::from_slice(&request_body).unwrap_or(Value::Null),
                    });
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
                }
            }
        };

        let app = Router::new().fallback(handler);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits, last }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CapturedRequest> {
        self.last.lock().unwrap().clone()
    }
}
