//! Client identity extraction for rate limiting.

use axum::extract::{ConnectInfo, Request};
use std::net::SocketAddr;

/// Identity used when no address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Returns the client IP for a request.
///
/// With `behind_proxy` the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`. Otherwise only the socket peer address is trusted, since
/// those headers are client-controlled.
pub fn client_ip(req: &Request, behind_proxy: bool) -> String {
    if behind_proxy && let Some(ip) = forwarded_ip(req) {
        return ip;
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_ip(req: &Request) -> Option<String> {
    let headers = req.headers();

    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return Some(ip.to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
