//! HTTP middleware for request processing and protection.
//!
//! Provides rate limiting, body sanitization, security headers,
//! authentication and observability middleware.

pub mod auth;
pub mod rate_limit;
pub mod sanitize;
pub mod security_headers;
pub mod tracing;
