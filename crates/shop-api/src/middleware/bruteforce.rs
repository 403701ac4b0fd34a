//! Brute-force guard for the auth endpoints
//!
//! Counts attempts per (tenant, route, client IP) in a fixed window. Once the
//! count passes the route's limit, requests get 429 with `Retry-After` until
//! the window ends.

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shop_common::TenantId;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ApiError;
use crate::middleware::tenant::Tenant;
use crate::AppState;

/// Routes with their own counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardedRoute {
    Login,
    Refresh,
    Registration,
}

/// Attempts allowed inside a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteLimit {
    pub max_attempts: u32,
    pub window_secs: u64,
}

impl RouteLimit {
    pub const fn new(max_attempts: u32, window_secs: u64) -> Self {
        Self { max_attempts, window_secs }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Limits per route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BruteforceConfig {
    pub enabled: bool,
    pub login: RouteLimit,
    pub refresh: RouteLimit,
    pub registration: RouteLimit,
}

impl Default for BruteforceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            login: RouteLimit::new(5, 15 * 60),
            refresh: RouteLimit::new(10, 15 * 60),
            registration: RouteLimit::new(3, 60 * 60),
        }
    }
}

/// Outcome of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed { remaining: u32 },
    Blocked { retry_after: Duration },
}

type CounterKey = (TenantId, GuardedRoute, String);

struct Counter {
    attempts: u32,
    reset_at: Instant,
}

/// Per-IP attempt counters
pub struct BruteforceGuard {
    config: BruteforceConfig,
    counters: DashMap<CounterKey, Counter>,
}

impl BruteforceGuard {
    pub fn new(config: BruteforceConfig) -> Self {
        Self { config, counters: DashMap::new() }
    }

    pub fn limit(&self, route: GuardedRoute) -> RouteLimit {
        match route {
            GuardedRoute::Login => self.config.login,
            GuardedRoute::Refresh => self.config.refresh,
            GuardedRoute::Registration => self.config.registration,
        }
    }

    /// Count an attempt
    pub fn check(&self, tenant_id: TenantId, route: GuardedRoute, ip: &str) -> Verdict {
        self.check_at(tenant_id, route, ip, Instant::now())
    }

    fn check_at(&self, tenant_id: TenantId, route: GuardedRoute, ip: &str, now: Instant) -> Verdict {
        if !self.config.enabled {
            return Verdict::Allowed { remaining: u32::MAX };
        }
        let limit = self.limit(route);

        let mut counter = self
            .counters
            .entry((tenant_id, route, ip.to_string()))
            .or_insert_with(|| Counter { attempts: 0, reset_at: now + limit.window() });
        if now >= counter.reset_at {
            counter.attempts = 0;
            counter.reset_at = now + limit.window();
        }
        counter.attempts = counter.attempts.saturating_add(1);

        if counter.attempts > limit.max_attempts {
            Verdict::Blocked { retry_after: counter.reset_at.saturating_duration_since(now) }
        } else {
            Verdict::Allowed { remaining: limit.max_attempts - counter.attempts }
        }
    }

    /// Forget the counter (successful login)
    pub fn reset(&self, tenant_id: TenantId, route: GuardedRoute, ip: &str) {
        self.counters.remove(&(tenant_id, route, ip.to_string()));
    }

    /// Drop expired counters; returns how many were removed
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let before = self.counters.len();
        self.counters.retain(|_, c| c.reset_at > now);
        before - self.counters.len()
    }

    pub fn tracked(&self) -> usize {
        self.counters.len()
    }
}

/// Best-effort client address: `x-forwarded-for` first hop, `x-real-ip`, socket, `unknown`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    fn from_parts(headers: &HeaderMap, socket: Option<SocketAddr>) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        let ip = header("x-forwarded-for")
            .or_else(|| header("x-real-ip"))
            .or_else(|| socket.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| "unknown".into());
        Self(ip)
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let socket = parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0);
        Ok(Self::from_parts(&parts.headers, socket))
    }
}

/// Layer state: which route this instance guards
#[derive(Clone)]
pub struct GuardLayer {
    state: Arc<AppState>,
    route: GuardedRoute,
}

impl GuardLayer {
    pub fn new(state: &Arc<AppState>, route: GuardedRoute) -> Self {
        Self { state: Arc::clone(state), route }
    }
}

/// Reject the request once the caller is over the route's limit
pub async fn bruteforce_middleware(
    State(layer): State<GuardLayer>,
    Tenant(ctx): Tenant,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match layer.state.bruteforce.check(ctx.tenant_id(), layer.route, &ip) {
        Verdict::Allowed { .. } => Ok(next.run(request).await),
        Verdict::Blocked { retry_after } => {
            tracing::warn!(tenant_id = %ctx.tenant_id(), route = ?layer.route, %ip, "too many attempts");
            // Round up so clients never retry a second early
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            Err(ApiError::TooManyRequests { retry_after_secs: secs.max(1) })
        }
    }
}
