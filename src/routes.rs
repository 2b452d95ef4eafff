//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`    - Health check: DB, counter store, fallback mode (public, not rate limited)
//! - `/api/users/*`    - Registration, login, profile
//! - `/api/waste/*`    - Waste listings (Bearer token required)
//! - `/uploads/*`      - Uploaded images
//!
//! # Middleware, outermost first
//!
//! 1. **Tracing** - Structured request/response logging
//! 2. **Compression** - gzip responses
//! 3. **CORS** - `FRONTEND_URL` or any origin
//! 4. **Security headers** - On every response, 429s included
//! 5. **Rate limiting** - Fixed-window tiers per client IP (`/api/*` only)
//! 6. **Sanitization** - JSON bodies under `/api`
//! 7. **Authentication** - Protected routes only

use std::time::Duration;

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::rate_limit::{LIMIT_HEADER, REMAINING_HEADER, RESET_HEADER};
use crate::api::middleware::{auth, rate_limit, sanitize, security_headers, tracing};
use crate::config::Config;
use crate::state::AppState;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

/// Router settings that are not part of the request state.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origin. `None` allows any origin without credentials.
    pub frontend_url: Option<String>,
    pub uploads_dir: String,
}

impl RouterConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            frontend_url: config.frontend_url.clone(),
            uploads_dir: config.uploads_dir.clone(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            frontend_url: None,
            uploads_dir: "uploads".to_string(),
        }
    }
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([LIMIT_HEADER, REMAINING_HEADER, RESET_HEADER, header::RETRY_AFTER])
        .max_age(Duration::from_secs(600));

    match frontend_url.and_then(|origin| HeaderValue::from_str(origin).ok()) {
        Some(origin) => base.allow_origin(origin).allow_credentials(true),
        None => base.allow_origin(Any),
    }
}

/// Constructs the application router with all routes and middleware.
///
/// Client identity for rate limiting comes from `ConnectInfo<SocketAddr>`, or
/// from proxy headers when `state.behind_proxy` is set, so the server must be
/// started with `into_make_service_with_connect_info`.
pub fn app_router(state: AppState, options: &RouterConfig) -> Router {
    let protected = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    let api_router = api::routes::public_routes()
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.clone(), sanitize::layer));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .nest_service("/uploads", ServeDir::new(&options.uploads_dir))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer))
        .layer(middleware::from_fn(security_headers::layer))
        .layer(cors_layer(options.frontend_url.as_deref()))
        .layer(CompressionLayer::new())
        .layer(tracing::layer())
        .with_state(state)
}
