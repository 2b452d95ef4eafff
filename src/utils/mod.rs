//! Helpers used across the request pipeline.
//!
//! - [`html_sanitizer`] - Markup stripping over JSON values
//! - [`client_ip`] - Client identity used as the rate limit key

pub mod client_ip;
pub mod html_sanitizer;
