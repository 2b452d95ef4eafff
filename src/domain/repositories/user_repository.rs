//! Repository trait for users.

use crate::domain::entities::{NewUser, ProfileUpdate, User};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for user accounts.
///
/// [`UserRepository::find_by_id`] doubles as the user directory consulted by
/// the auth middleware on every protected request.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUserRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks a user up by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Looks a user up by lowercased email.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Creates a user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the email is already taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    /// Applies a partial profile update and returns the updated user.
    ///
    /// Returns `Ok(None)` if the user does not exist.
    async fn update_profile(&self, id: i64, update: ProfileUpdate)
    -> Result<Option<User>, AppError>;

    /// Increments the failed login counter.
    async fn record_failed_login(&self, id: i64) -> Result<(), AppError>;

    /// Resets the failed login counter and stamps `last_login`.
    async fn record_successful_login(&self, id: i64) -> Result<(), AppError>;

    /// Increments `total_waste_listed` after a new listing.
    async fn increment_waste_listed(&self, id: i64) -> Result<(), AppError>;

    /// Checks if the backing store is reachable.
    async fn health_check(&self) -> bool;
}
