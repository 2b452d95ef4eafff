//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: database and counter store reachable
/// - **503 Service Unavailable**: one of them is not
///
/// The `rate_limiter` check reports whether decisions currently come from
/// the in-process fallback; it does not affect the status code.
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "counter_store": { "status": "ok", "message": "Reachable" },
///     "rate_limiter": { "status": "ok", "message": "Shared counters" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = if state.users.health_check().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error("Database connection failed")
    };

    let counter_store = if state.rate_limiter.primary_healthy().await {
        CheckStatus::ok("Reachable")
    } else {
        CheckStatus::error("Counter store unreachable")
    };

    let rate_limiter = if state.rate_limiter.is_degraded() {
        CheckStatus::ok("Fallback to in-process counters")
    } else {
        CheckStatus::ok("Shared counters")
    };

    let healthy = database.is_ok() && counter_store.is_ok();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            counter_store,
            rate_limiter,
        },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
