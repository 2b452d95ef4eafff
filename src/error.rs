//! Application error type and its HTTP rendering.
//!
//! Every error leaves the service as
//!
//! ```json
//! { "success": false, "message": "..." }
//! ```
//!
//! with the status code of its variant.

use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::rate_limit::Tier;

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

/// Why a bearer credential was rejected.
///
/// The kind is logged and counted; the client sees only [`AuthErrorKind::message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// No usable `Authorization: Bearer` header, or the subject is unknown.
    Unauthenticated,
    /// Signature or structure check failed.
    InvalidToken,
    /// Signature is valid but `exp` has passed.
    Expired,
}

impl AuthErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorKind::Unauthenticated => "unauthenticated",
            AuthErrorKind::InvalidToken => "invalid_token",
            AuthErrorKind::Expired => "expired",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthErrorKind::Unauthenticated => "Unauthorized",
            AuthErrorKind::InvalidToken => "Invalid token",
            AuthErrorKind::Expired => "Token expired",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{}", .kind.message())]
    Unauthorized { kind: AuthErrorKind },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    PayloadTooLarge { message: String },

    #[error("{message}")]
    RateLimited {
        tier: Tier,
        message: String,
        retry_after: Duration,
    },

    #[error("{message}")]
    Unavailable { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
    pub fn unauthorized(kind: AuthErrorKind) -> Self {
        Self::Unauthorized { kind }
    }
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge {
            message: message.into(),
        }
    }
    pub fn rate_limited(tier: Tier, message: impl Into<String>, retry_after: Duration) -> Self {
        Self::RateLimited {
            tier,
            message: message.into(),
            retry_after,
        }
    }
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Whole seconds, rounded up, never zero.
pub(crate) fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let extra_header = match &self {
            AppError::Unauthorized { .. } => {
                Some((header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer")))
            }
            AppError::RateLimited { retry_after, .. } => Some((
                header::RETRY_AFTER,
                HeaderValue::from(retry_after_secs(*retry_after)),
            )),
            _ => None,
        };

        if let AppError::Internal { message } = &self {
            tracing::error!(%message, "Internal error");
        }

        let body = ErrorBody {
            success: false,
            message: self.to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        if let Some((name, value)) = extra_header {
            response.headers_mut().insert(name, value);
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return AppError::bad_request("Duplicate field value entered");
        }

        tracing::error!(error = %e, "Database error");
        AppError::internal("Database error")
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid"))
                })
            })
            .collect::<Vec<_>>()
            .join(", ");

        AppError::bad_request(message)
    }
}
