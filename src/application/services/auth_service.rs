//! JWT issuing and bearer token authentication.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::timeout;
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

use crate::domain::entities::{Role, User};
use crate::domain::repositories::UserRepository;
use crate::error::{AppError, AuthErrorKind};

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Identity attached to request extensions once a token is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to sign token: {0}")]
    Encode(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        }
    }
}

impl From<&JwtError> for AuthErrorKind {
    fn from(e: &JwtError) -> Self {
        match e {
            JwtError::Expired => AuthErrorKind::Expired,
            JwtError::Invalid(_) | JwtError::Encode(_) => AuthErrorKind::InvalidToken,
        }
    }
}

/// Service for issuing and verifying access tokens.
///
/// The signing secret is injected at construction and never read from the
/// environment here. Verification resolves the token subject through the
/// [`UserRepository`], so a token for a deleted user is rejected.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
    lookup_timeout: Duration,
    lookup_attempts: usize,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `users` - user directory for subject lookups
    /// - `secret` - HS256 signing secret
    /// - `token_ttl` - lifetime of issued tokens
    /// - `lookup_timeout` - deadline for one directory lookup
    /// - `lookup_attempts` - total lookup attempts before giving up
    pub fn new(
        users: Arc<dyn UserRepository>,
        secret: &str,
        token_ttl: Duration,
        lookup_timeout: Duration,
        lookup_attempts: usize,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            users,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_ttl,
            lookup_timeout,
            lookup_attempts: lookup_attempts.max(1),
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Signs a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Encode`] if signing fails.
    pub fn issue_token(&self, user: &User) -> Result<String, JwtError> {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX);

        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            iat,
            exp: iat.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encode(e.to_string()))
    }

    /// Checks signature, structure and expiry with zero leeway.
    pub fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Authenticates a raw bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if:
    /// - the token is malformed or its signature does not match (`InvalidToken`)
    /// - the token has expired (`Expired`)
    /// - the subject is not a known user (`Unauthenticated`)
    ///
    /// Returns [`AppError::Unavailable`] if the user directory cannot be
    /// reached within the retry budget.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = self.verify_token(token).map_err(|e| {
            let kind = AuthErrorKind::from(&e);
            debug!(error = %e, kind = kind.as_str(), "Token rejected");
            record_failure(kind)
        })?;

        let user_id: i64 = claims.sub.parse().map_err(|_| {
            debug!(sub = %claims.sub, "Token subject is not a user id");
            record_failure(AuthErrorKind::InvalidToken)
        })?;

        match self.lookup(user_id).await? {
            Some(user) => Ok(AuthenticatedUser {
                id: user.id,
                role: user.role,
            }),
            None => {
                debug!(user_id, "Token subject not found");
                Err(record_failure(AuthErrorKind::Unauthenticated))
            }
        }
    }

    async fn lookup(&self, id: i64) -> Result<Option<User>, AppError> {
        let users = &self.users;
        let deadline = self.lookup_timeout;
        let strategy = ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_secs(3))
            .take(self.lookup_attempts - 1);

        Retry::start(strategy, move || async move {
            match timeout(deadline, users.find_by_id(id)).await {
                Ok(result) => result,
                Err(_) => Err(AppError::unavailable("User lookup timed out")),
            }
        })
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = id, "User directory unavailable");
            AppError::unavailable("Authentication service unavailable")
        })
    }
}

/// Counts a rejected credential and builds the 401 for it.
pub fn record_failure(kind: AuthErrorKind) -> AppError {
    counter!("auth_failures_total", "kind" => kind.as_str()).increment(1);
    AppError::unauthorized(kind)
}
