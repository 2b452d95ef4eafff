//! Handlers for account endpoints.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::users::{
    AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest, UserEnvelope,
};
use crate::api::extract::ApiJson;
use crate::application::services::{AuthenticatedUser, Session};
use crate::error::AppError;
use crate::state::AppState;

fn auth_response(session: Session) -> AuthResponse {
    AuthResponse {
        success: true,
        token: session.token,
        user: session.user.into(),
    }
}

/// Creates an account.
///
/// # Endpoint
///
/// `POST /api/users/register`
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Dana",
///   "email": "dana@example.com",
///   "password": "Str0ng!pass",
///   "role": "producer",
///   "company": "GreenCo",
///   "location": "Leeds"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 on validation failure or a duplicate email.
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.validate()?;

    let session = state.user_service.register(payload.into()).await?;

    Ok((StatusCode::CREATED, Json(auth_response(session))))
}

/// Signs a user in.
///
/// # Endpoint
///
/// `POST /api/users/login`
///
/// # Errors
///
/// Returns 401 `Invalid credentials` for an unknown email or wrong password.
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let session = state
        .user_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(auth_response(session)))
}

/// `GET /api/users/me`
pub async fn me_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Json<UserEnvelope>, AppError> {
    let user = state.user_service.current_user(caller.id).await?;

    Ok(Json(UserEnvelope {
        success: true,
        user: user.into(),
    }))
}

/// Updates name, company or location of the caller.
///
/// # Endpoint
///
/// `PUT /api/users/profile`
pub async fn update_profile_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserEnvelope>, AppError> {
    payload.validate()?;

    let user = state
        .user_service
        .update_profile(caller.id, payload.into())
        .await?;

    Ok(Json(UserEnvelope {
        success: true,
        user: user.into(),
    }))
}
