//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use tracing::debug;

use crate::application::services::auth_service::record_failure;
use crate::error::{AppError, AuthErrorKind};
use crate::state::AppState;

/// Authenticates requests using a JWT from the Authorization header.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// On success the [`AuthenticatedUser`](crate::application::services::AuthenticatedUser)
/// is inserted into request extensions for handlers to extract.
///
/// # Errors
///
/// Returns `401 Unauthorized` with `WWW-Authenticate: Bearer` if:
/// - the header is missing or not a bearer credential (`Unauthorized`)
/// - the token fails signature or structure checks (`Invalid token`)
/// - the token has expired (`Token expired`)
/// - the token subject is not a known user (`Unauthorized`)
///
/// Returns `503 Service Unavailable` if the user directory cannot be reached.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            debug!(path = %parts.uri.path(), "Missing or malformed Authorization header");
            record_failure(AuthErrorKind::Unauthenticated)
        })?;

    let user = st.auth_service.authenticate(token.trim()).await?;
    parts.extensions.insert(user);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
