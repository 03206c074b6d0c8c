//! Per-client request limiting.
//!
//! Every request is counted against the client address in a fixed one-minute
//! window. Once the budget is spent the request is answered with 429 and a
//! `Retry-After` header until the window resets.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ApiError;
use mediagate_shared::AppError;

const SHARD_COUNT: u64 = 16;
const MAX_WINDOWS_PER_SHARD: usize = 10_000;
const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Request count of one client in the current window.
#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

impl Window {
    fn new(now: Instant, length: Duration) -> Self {
        Self {
            count: 0,
            reset_at: now + length,
        }
    }

    fn check_and_increment(
        &mut self,
        limit: u32,
        length: Duration,
        now: Instant,
    ) -> Result<u32, Duration> {
        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + length;
        }

        if self.count < limit {
            self.count += 1;
            Ok(limit - self.count)
        } else {
            Err(self.reset_at.saturating_duration_since(now))
        }
    }
}

/// In-memory fixed-window limiter keyed by client.
///
/// Keys are hashed onto shards so concurrent clients rarely wait on the same
/// lock.
#[derive(Debug)]
pub struct RateLimiter {
    shards: Vec<Mutex<HashMap<String, Window>>>,
    limit: u32,
    window: Duration,
    trusted_proxies: usize,
}

impl RateLimiter {
    /// Creates a limiter allowing `limit` requests per client per minute.
    #[must_use]
    pub fn per_minute(limit: u32, trusted_proxies: usize) -> Self {
        Self::new(limit, Duration::from_secs(60), trusted_proxies)
    }

    /// Creates a limiter with a custom window length.
    #[must_use]
    pub fn new(limit: u32, window: Duration, trusted_proxies: usize) -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::default()).collect(),
            limit,
            window,
            trusted_proxies,
        }
    }

    /// Counts one request for `key`.
    ///
    /// Returns the requests left in the window, or the time until the window
    /// resets once the budget is spent.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let now = Instant::now();
        let mut windows = self.shards[self.shard_index(key)].lock().await;

        if windows.len() >= MAX_WINDOWS_PER_SHARD && !windows.contains_key(key) {
            windows.retain(|_, w| w.reset_at > now);
            if windows.len() >= MAX_WINDOWS_PER_SHARD
                && let Some(oldest) = windows
                    .iter()
                    .min_by_key(|(_, w)| w.reset_at)
                    .map(|(k, _)| k.clone())
            {
                windows.remove(&oldest);
            }
        }

        windows
            .entry(key.to_string())
            .or_insert_with(|| Window::new(now, self.window))
            .check_and_increment(self.limit, self.window, now)
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        usize::try_from(hasher.finish() % SHARD_COUNT).unwrap_or_default()
    }
}

/// Resolves the address a request is counted against.
///
/// With `trusted_proxies` set, the client is the `X-Forwarded-For` entry
/// appended by the outermost trusted proxy. Entries to its left are client
/// supplied and ignored. Otherwise the socket peer is used.
fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxies: usize,
) -> Option<IpAddr> {
    if trusted_proxies > 0
        && let Some(chain) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok())
    {
        let hops: Vec<&str> = chain
            .split(',')
            .map(str::trim)
            .filter(|hop| !hop.is_empty())
            .collect();
        let forwarded = hops
            .get(hops.len().saturating_sub(trusted_proxies))
            .and_then(|hop| hop.parse::<IpAddr>().ok());
        if forwarded.is_some() {
            return forwarded;
        }
    }

    peer.map(|addr| addr.ip())
}

fn set_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
}

/// Rejects requests from clients that spent their budget.
///
/// Allowed responses carry `X-RateLimit-Limit` and `X-RateLimit-Remaining`.
/// Rejections are 429 `RATE_LIMITED` with `Retry-After` in seconds.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_ip(request.headers(), peer, limiter.trusted_proxies)
        .map_or_else(|| "unknown".to_string(), |ip| format!("ip:{ip}"));

    match limiter.check(&key).await {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            set_limit_headers(response.headers_mut(), limiter.limit, remaining);
            response
        }
        Err(reset_in) => {
            warn!(
                client = %key,
                path = %request.uri().path(),
                limit = limiter.limit,
                "Rate limit exceeded"
            );
            let mut response = ApiError(AppError::TooManyRequests {
                client: key,
                retry_after_secs: reset_in.as_secs().max(1),
            })
            .into_response();
            set_limit_headers(response.headers_mut(), limiter.limit, 0);
            response
        }
    }
}
