//! Per-IP rate limiting for the reservation and admin login routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Fixed-window limit for one route
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub route: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

pub const RESERVE_LIMIT: RateLimit = RateLimit {
    route: "reserve",
    max_requests: 10,
    window: Duration::from_secs(60),
};

pub const LOGIN_LIMIT: RateLimit = RateLimit {
    route: "admin_login",
    max_requests: 5,
    window: Duration::from_secs(60),
};

/// Entries idle this long are dropped by [`RateLimiter::cleanup`]
const STALE_AFTER: Duration = Duration::from_secs(300);

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(&self, limit: RateLimit, ip: &str) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(limit.route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= limit.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= limit.max_requests
    }

    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < STALE_AFTER);
        }
        map.retain(|_, route_map| !route_map.is_empty());
    }
}

/// Client IP: first X-Forwarded-For entry (reverse proxy), then peer address.
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn enforce(
    state: &crate::state::AppState,
    limit: RateLimit,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request);
    if !state.rate_limiter.check(limit, &ip).await {
        tracing::warn!(route = limit.route, ip = %ip, "Rate limit exceeded");
        return Err(AppError::too_many_requests());
    }
    Ok(next.run(request).await)
}

/// 10 reservations per minute per IP
pub async fn reserve_rate_limit(
    State(state): State<crate::state::AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, RESERVE_LIMIT, request, next).await
}

/// 5 login attempts per minute per IP
pub async fn login_rate_limit(
    State(state): State<crate::state::AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, LOGIN_LIMIT, request, next).await
}
