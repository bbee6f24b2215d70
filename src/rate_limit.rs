//! Request quotas applied in front of the handlers.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::trace;

use crate::error::ApiError;
use crate::schemas::AppState;

/// Fixed per-minute quotas shared by all clients.
#[derive(Clone)]
pub struct RateLimits {
    global: Arc<DefaultDirectRateLimiter>,
    login: Arc<DefaultDirectRateLimiter>,
    global_per_minute: u32,
    login_per_minute: u32,
}

fn per_minute(limit: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN))
}

impl RateLimits {
    /// A limit of zero is raised to one request per minute.
    pub fn new(global_per_minute: u32, login_per_minute: u32) -> Self {
        Self {
            global: Arc::new(RateLimiter::direct(per_minute(global_per_minute))),
            login: Arc::new(RateLimiter::direct(per_minute(login_per_minute))),
            global_per_minute,
            login_per_minute,
        }
    }
}

impl fmt::Debug for RateLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimits")
            .field("global_per_minute", &self.global_per_minute)
            .field("login_per_minute", &self.login_per_minute)
            .finish()
    }
}

pub async fn global_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.rate_limits.global.check().is_err() {
        trace!("Global quota exhausted for {}", request.uri().path());
        return ApiError::TooManyRequests.into_response();
    }
    next.run(request).await
}

pub async fn login_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.rate_limits.login.check().is_err() {
        trace!("Login quota exhausted");
        return ApiError::TooManyRequests.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_allows_burst_then_rejects() {
        let limits = RateLimits::new(100, 3);

        for _ in 0..3 {
            assert!(limits.login.check().is_ok());
        }
        assert!(limits.login.check().is_err());
        assert!(limits.global.check().is_ok());
    }

    #[test]
    fn test_zero_limit_still_admits_one() {
        let limits = RateLimits::new(0, 0);

        assert!(limits.global.check().is_ok());
        assert!(limits.global.check().is_err());
    }
}
