//! Rate limiting middleware.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, RwLock},
    time::Duration,
};

use tokio::task::JoinHandle;

use crate::web::error::ApiError;

/// How often idle limiters are dropped.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Per-IP rate limiter using Governor.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

type LimiterMap = RwLock<HashMap<String, Arc<IpRateLimiter>>>;

/// State for rate limiting.
#[derive(Clone)]
pub struct RateLimitState {
    /// Per-IP rate limiters for the login endpoint.
    login_limiters: Arc<LimiterMap>,
    /// Per-IP rate limiters for the rest of the API.
    api_limiters: Arc<LimiterMap>,
    /// Login rate limit (requests per minute).
    login_rate_limit: u32,
    /// API rate limit (requests per minute).
    api_rate_limit: u32,
}

impl RateLimitState {
    /// Create a new rate limit state.
    pub fn new(login_rate_limit: u32, api_rate_limit: u32) -> Self {
        Self {
            login_limiters: Arc::new(RwLock::new(HashMap::new())),
            api_limiters: Arc::new(RwLock::new(HashMap::new())),
            login_rate_limit,
            api_rate_limit,
        }
    }

    /// Get or create a rate limiter for the given IP.
    fn get_or_create_limiter(
        limiters: &LimiterMap,
        ip: &str,
        requests_per_minute: u32,
    ) -> Arc<IpRateLimiter> {
        {
            let read_guard = limiters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(limiter) = read_guard.get(ip) {
                return limiter.clone();
            }
        }

        let mut write_guard = limiters.write().unwrap_or_else(|e| e.into_inner());

        // Another request may have inserted it while we waited
        if let Some(limiter) = write_guard.get(ip) {
            return limiter.clone();
        }

        let quota =
            Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        write_guard.insert(ip.to_string(), limiter.clone());
        limiter
    }

    /// Check if a login attempt from `ip` is allowed.
    pub fn check_login(&self, ip: &str) -> bool {
        let limiter = Self::get_or_create_limiter(&self.login_limiters, ip, self.login_rate_limit);
        limiter.check().is_ok()
    }

    /// Check if an API request from `ip` is allowed.
    pub fn check_api(&self, ip: &str) -> bool {
        let limiter = Self::get_or_create_limiter(&self.api_limiters, ip, self.api_rate_limit);
        limiter.check().is_ok()
    }

    /// Drop limiters that no request currently holds.
    pub fn cleanup(&self) {
        for limiters in [&self.login_limiters, &self.api_limiters] {
            let mut guard = limiters.write().unwrap_or_else(|e| e.into_inner());
            guard.retain(|_, v| Arc::strong_count(v) > 1);
        }
    }

    /// Start a background task to periodically clean up old entries.
    ///
    /// The task stops once the last handle to the state is dropped.
    pub fn start_cleanup_task(self: &Arc<Self>) -> JoinHandle<()> {
        self.start_cleanup_task_every(CLEANUP_INTERVAL)
    }

    /// Like [`start_cleanup_task`](Self::start_cleanup_task) with a custom period.
    pub fn start_cleanup_task_every(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let state = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                match state.upgrade() {
                    Some(state) => state.cleanup(),
                    None => break,
                }
            }
        })
    }
}

/// Extract client IP from request.
fn get_client_ip(req: &Request<Body>) -> String {
    // Reverse proxy headers first
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    if let Some(real_ip) = req
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
    {
        return real_ip.to_string();
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Rate limiting middleware for the login endpoint.
pub async fn login_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req);

    if !state.check_login(&ip) {
        tracing::warn!(ip = %ip, "Login rate limit exceeded");
        return ApiError::too_many_requests("Too many login attempts. Please try again later.")
            .into_response();
    }

    next.run(req).await
}

/// Rate limiting middleware for the whole API.
pub async fn api_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req);

    if !state.check_api(&ip) {
        tracing::warn!(ip = %ip, "API rate limit exceeded");
        return ApiError::too_many_requests("Too many requests. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
