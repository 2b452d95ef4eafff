//! Per-client fixed-window rate limiting.
//!
//! Installed on the top-level router, so it sees full request paths.
//!
//! | request | tiers, in order |
//! |---|---|
//! | `POST /api/users/login` | general, login |
//! | `POST /api/users/register` | general, account creation |
//! | any other `/api/*` | general |
//! | everything else | none |
//!
//! The first tier that denies ends the request with 429; later tiers are not
//! counted.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::time::Duration;

use crate::domain::rate_limit::{RateLimitDecision, Tier};
use crate::error::{AppError, retry_after_secs};
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

pub const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

const GENERAL: &[Tier] = &[Tier::General];
const LOGIN: &[Tier] = &[Tier::General, Tier::Login];
const ACCOUNT_CREATION: &[Tier] = &[Tier::General, Tier::AccountCreation];

/// Returns the tiers that apply to a request, outermost first.
pub fn tiers_for(method: &Method, path: &str) -> &'static [Tier] {
    if path != "/api" && !path.starts_with("/api/") {
        return &[];
    }

    match (method, path) {
        (&Method::POST, "/api/users/login") => LOGIN,
        (&Method::POST, "/api/users/register") => ACCOUNT_CREATION,
        _ => GENERAL,
    }
}

/// Enforces the rate limit tiers of the request.
///
/// # Errors
///
/// Returns `429 Too Many Requests` with the tier's message and a
/// `Retry-After` header when a tier is exhausted.
///
/// Allowed responses carry `X-RateLimit-Limit`, `X-RateLimit-Remaining` and
/// `X-RateLimit-Reset` for the last tier evaluated.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let tiers = tiers_for(req.method(), req.uri().path());
    if tiers.is_empty() {
        return Ok(next.run(req).await);
    }

    let identity = client_ip(&req, st.behind_proxy);

    let mut quota = None;
    for &tier in tiers {
        match st.rate_limiter.check(tier, &identity).await {
            RateLimitDecision::Allow {
                limit,
                remaining,
                reset_after,
            } => quota = Some((limit, remaining, reset_after)),
            RateLimitDecision::Deny {
                tier,
                message,
                retry_after,
            } => return Err(AppError::rate_limited(tier, message, retry_after)),
        }
    }

    let mut response = next.run(req).await;
    if let Some((limit, remaining, reset_after)) = quota {
        insert_quota_headers(response.headers_mut(), limit, remaining, reset_after);
    }
    Ok(response)
}

fn insert_quota_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_after: Duration) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(retry_after_secs(reset_after)));
}
