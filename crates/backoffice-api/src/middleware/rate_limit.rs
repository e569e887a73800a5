//! # Per-Caller Rate Limiting
//!
//! Fixed-window limiter keyed by the bearer user id, falling back to the
//! first `X-Forwarded-For` address and then to `"anonymous"`.
//!
//! Expired windows are swept at most once per window length, so the table
//! only holds callers seen during the last two windows.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;

use crate::auth::bearer_user_hint;
use crate::error::AppError;

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u64,
    /// Window duration in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 1000,
            window_secs: 60,
        }
    }
}

#[derive(Debug, Clone)]
struct Window {
    count: u64,
    started: Instant,
}

#[derive(Debug)]
struct Windows {
    by_key: HashMap<String, Window>,
    last_sweep: Instant,
}

/// Shared rate limiter state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<Windows>>,
}

impl RateLimiter {
    /// Create a limiter with the given config.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(Windows {
                by_key: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    /// Count a request for `key`, returning whether it is allowed.
    fn check(&self, key: &str, now: Instant) -> bool {
        let window_len = Duration::from_secs(self.config.window_secs);
        let mut windows = self.windows.lock();

        if now.duration_since(windows.last_sweep) >= window_len {
            windows
                .by_key
                .retain(|_, w| now.duration_since(w.started) < window_len);
            windows.last_sweep = now;
        }

        let window = windows.by_key.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started) >= window_len {
            window.count = 0;
            window.started = now;
        }

        if window.count >= self.config.max_requests {
            false
        } else {
            window.count += 1;
            true
        }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.windows.lock().by_key.len()
    }
}

fn client_key(request: &Request) -> String {
    if let Some(user) = bearer_user_hint(request) {
        return format!("user:{user}");
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(|ip| format!("ip:{ip}"))
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Middleware that enforces per-caller rate limits.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    if let Some(limiter) = request.extensions().get::<RateLimiter>().cloned() {
        let key = client_key(&request);
        if !limiter.check(&key, Instant::now()) {
            tracing::warn!(client = %key, "rate limit exceeded");
            return AppError::RateLimited("rate limit exceeded".into()).into_response();
        }
    }

    next.run(request).await
}
