use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

struct Window {
    opened: Instant,
    used: u32,
}

/// Fixed one-second window over the whole API. Coarse on purpose, the
/// service sits behind a trusted frontend and only needs a backstop.
#[derive(Clone)]
pub struct RpsLimit {
    limit: u32,
    window: Arc<Mutex<Window>>,
}

impl RpsLimit {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            window: Arc::new(Mutex::new(Window {
                opened: Instant::now(),
                used: 0,
            })),
        }
    }

    fn try_acquire(&self) -> bool {
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        if now.duration_since(window.opened) >= Duration::from_secs(1) {
            window.opened = now;
            window.used = 0;
        }
        if window.used < self.limit {
            window.used += 1;
            true
        } else {
            false
        }
    }
}

pub async fn limit_middleware(
    State(limit): State<RpsLimit>,
    request: Request,
    next: Next,
) -> Response {
    if !limit.try_acquire() {
        warn!(path = %request.uri().path(), "Request rejected by rate limit");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Too many requests" })),
        )
            .into_response();
    }
    next.run(request).await
}
