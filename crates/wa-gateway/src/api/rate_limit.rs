//! Per-client fixed-window rate limiting.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tracing::warn;

use super::ApiError;

/// Tracked clients above which expired windows are swept.
const SWEEP_THRESHOLD: usize = 10_000;

const LIMITED_MESSAGE: &str = "Too many requests from this IP, please try again later.";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Result of rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
    },
    /// Request is rate limited
    Limited {
        /// Time until the window resets
        retry_after: Duration,
    },
}

/// Counts requests per client within fixed windows.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    trust_proxy: bool,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    /// Allow `max_requests` per client in every `window`.
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            trust_proxy: false,
            windows: DashMap::new(),
        }
    }

    /// Key callers on `X-Forwarded-For` / `X-Real-IP` instead of the peer
    /// address. Only safe behind a proxy that overwrites those headers.
    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Maximum requests per window.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count one request from `client`.
    pub fn check(&self, client: &str) -> RateLimitResult {
        let now = Instant::now();

        let result = {
            let mut entry = self.windows.entry(client.to_string()).or_insert(Window {
                started: now,
                count: 0,
            });
            if now.duration_since(entry.started) >= self.window {
                *entry = Window {
                    started: now,
                    count: 0,
                };
            }

            if entry.count < self.max_requests {
                entry.count += 1;
                RateLimitResult::Allowed {
                    remaining: self.max_requests - entry.count,
                }
            } else {
                RateLimitResult::Limited {
                    retry_after: self.window.saturating_sub(now.duration_since(entry.started)),
                }
            }
        };

        if self.windows.len() > SWEEP_THRESHOLD {
            self.windows
                .retain(|_, w| now.duration_since(w.started) < self.window);
        }

        result
    }

    /// Number of clients currently tracked.
    pub fn client_count(&self) -> usize {
        self.windows.len()
    }
}

/// Identify the caller by peer address, or by proxy headers when the
/// proxy is trusted.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let peer = peer.map(|addr| addr.ip().to_string());
    if !trust_proxy {
        return peer.unwrap_or_else(|| "unknown".to_string());
    }

    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or(peer)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware rejecting callers over their budget with 429.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(request.headers(), peer, limiter.trust_proxy);

    match limiter.check(&client) {
        RateLimitResult::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("RateLimit-Limit", HeaderValue::from(limiter.max_requests()));
            headers.insert("RateLimit-Remaining", HeaderValue::from(remaining));
            response
        }
        RateLimitResult::Limited { retry_after } => {
            warn!("Rate limit exceeded for {}", client);
            let mut response = ApiError::TooManyRequests(LIMITED_MESSAGE.to_string()).into_response();
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from(retry_after.as_secs().max(1)));
            response
        }
    }
}
