//! Repository trait for waste listings.

use crate::domain::entities::{NewWasteListing, StatusChange, WasteListing, WasteSearch};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for waste listings.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgWasteRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WasteRepository: Send + Sync {
    /// Stores a new listing with status `available`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, listing: NewWasteListing) -> Result<WasteListing, AppError>;

    /// Finds a listing by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<WasteListing>, AppError>;

    /// Applies a status change. Returns `Ok(None)` if the listing does not exist.
    async fn update_status(
        &self,
        id: i64,
        change: StatusChange,
    ) -> Result<Option<WasteListing>, AppError>;

    /// Lists an owner's listings, newest first.
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<WasteListing>, AppError>;

    /// Searches listings, newest first.
    async fn search(&self, filter: WasteSearch) -> Result<Vec<WasteListing>, AppError>;
}
