//! API route configuration.
//!
//! Paths are relative to the `/api` nest.

use crate::api::handlers::{
    create_waste_handler, get_waste_handler, login_handler, me_handler, register_handler,
    search_waste_handler, update_profile_handler, update_status_handler, user_waste_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch, post, put},
};

/// Routes reachable without a token.
///
/// - `POST /users/register` - Create an account
/// - `POST /users/login`    - Sign in
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register_handler))
        .route("/users/login", post(login_handler))
}

/// Routes behind bearer authentication.
///
/// - `GET   /users/me`          - Current user
/// - `PUT   /users/profile`     - Update own profile
/// - `POST  /waste`             - Create a listing
/// - `GET   /waste/user`        - Own listings
/// - `GET   /waste/search`      - Search listings
/// - `GET   /waste/{id}`        - Listing details
/// - `PATCH /waste/{id}/status` - Update listing status
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me_handler))
        .route("/users/profile", put(update_profile_handler))
        .route("/waste", post(create_waste_handler))
        .route("/waste/user", get(user_waste_handler))
        .route("/waste/search", get(search_waste_handler))
        .route("/waste/{id}", get(get_waste_handler))
        .route("/waste/{id}/status", patch(update_status_handler))
}
