//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, counter store selection, service wiring and
//! the Axum server lifecycle.

use crate::application::services::{AuthService, RateLimiter, UserService, WasteService};
use crate::config::Config;
use crate::domain::repositories::{UserRepository, WasteRepository};
use crate::infrastructure::counter::{CounterStore, MemoryCounterStore, RedisCounterStore};
use crate::infrastructure::persistence::{PgUserRepository, PgWasteRepository};
use crate::routes::{RouterConfig, app_router};
use crate::state::AppState;
use crate::utils::html_sanitizer::Sanitizer;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;

/// How often expired in-process rate limit windows are dropped.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

const STARTUP_PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Connects to PostgreSQL and applies pending migrations.
pub async fn connect_database(config: &Config) -> Result<sqlx::PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}

/// Picks the primary counter store: Redis whenever a URL is configured,
/// otherwise the in-process `fallback`.
///
/// A Redis that is down at startup is still installed. The rate limiter then
/// runs degraded on the fallback and switches back once Redis answers.
pub async fn primary_counter_store(
    redis_url: Option<&str>,
    fallback: Arc<MemoryCounterStore>,
) -> Arc<dyn CounterStore> {
    let Some(redis_url) = redis_url else {
        tracing::info!("Redis not configured; rate limiting uses in-process counters");
        return fallback;
    };

    let redis = match RedisCounterStore::new(redis_url) {
        Ok(redis) => redis,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Invalid Redis URL; rate limiting uses in-process counters"
            );
            return fallback;
        }
    };

    let reachable = tokio::time::timeout(STARTUP_PING_TIMEOUT, redis.health_check())
        .await
        .unwrap_or(false);
    if reachable {
        tracing::info!("Rate limiting uses shared Redis counters");
    } else {
        tracing::warn!("Redis unreachable at startup; in-process counters are used until it recovers");
    }

    Arc::new(redis)
}

/// Wires services over the given repositories and counter stores.
pub fn build_state(
    config: &Config,
    users: Arc<dyn UserRepository>,
    listings: Arc<dyn WasteRepository>,
    primary: Arc<dyn CounterStore>,
    fallback: Arc<dyn CounterStore>,
) -> AppState {
    let auth_service = Arc::new(AuthService::new(
        users.clone(),
        &config.jwt_secret,
        Duration::from_secs(config.jwt_ttl_seconds),
        Duration::from_millis(config.user_lookup_timeout_ms),
        config.counter_store_max_attempts,
    ));

    let user_service = Arc::new(UserService::new(
        users.clone(),
        auth_service.clone(),
        config.bcrypt_cost,
    ));
    let waste_service = Arc::new(WasteService::new(listings, users.clone()));

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_rules(),
        primary,
        fallback,
        config.store_policy(),
    ));

    AppState {
        users,
        auth_service,
        user_service,
        waste_service,
        rate_limiter,
        sanitizer: Sanitizer::new(config.sanitize_max_depth),
        max_body_bytes: config.max_body_bytes,
        behind_proxy: config.behind_proxy,
    }
}

fn spawn_purge_task(store: Arc<MemoryCounterStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired rate limit windows");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Runs the HTTP server with the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = Arc::new(connect_database(&config).await?);

    let memory_store = Arc::new(MemoryCounterStore::new());
    spawn_purge_task(memory_store.clone());
    let primary = primary_counter_store(config.redis_url.as_deref(), memory_store.clone()).await;

    let state = build_state(
        &config,
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgWasteRepository::new(pool)),
        primary,
        memory_store,
    );

    let app = NormalizePathLayer::trim_trailing_slash()
        .layer(app_router(state, &RouterConfig::from_config(&config)));

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
