//! Shared application state injected into handlers and middleware.

use std::sync::Arc;

use crate::application::services::{AuthService, RateLimiter, UserService, WasteService};
use crate::domain::repositories::UserRepository;
use crate::utils::html_sanitizer::Sanitizer;

/// Everything a request needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub waste_service: Arc<WasteService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub sanitizer: Sanitizer,
    /// Largest JSON body the sanitization stage buffers.
    pub max_body_bytes: usize,
    /// Read client identity from proxy headers instead of the peer address.
    pub behind_proxy: bool,
}
