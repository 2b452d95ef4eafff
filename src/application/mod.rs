//! Application layer services implementing business logic.
//!
//! Services consume repository and counter store traits and give HTTP
//! handlers and middleware a narrow API.
//!
//! # Available Services
//!
//! - [`services::rate_limiter::RateLimiter`] - Fixed-window tiers over the shared counter store
//! - [`services::auth_service::AuthService`] - JWT issuing and bearer authentication
//! - [`services::user_service::UserService`] - Registration, login and profiles
//! - [`services::waste_service::WasteService`] - Waste listing lifecycle and search

pub mod services;
