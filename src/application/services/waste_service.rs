//! Waste listing management.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entities::{
    NewWasteListing, StatusChange, WasteListing, WasteSearch, WasteStatus,
};
use crate::domain::repositories::{UserRepository, WasteRepository};
use crate::error::AppError;

const NOT_FOUND: &str = "Waste listing not found";

/// Service for creating, tracking and searching waste listings.
pub struct WasteService {
    listings: Arc<dyn WasteRepository>,
    users: Arc<dyn UserRepository>,
}

impl WasteService {
    pub fn new(listings: Arc<dyn WasteRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { listings, users }
    }

    /// Stores a listing owned by `listing.owner_id` and bumps the owner's
    /// listing counter.
    ///
    /// A failure to bump the counter is logged and does not fail the request.
    pub async fn create(&self, listing: NewWasteListing) -> Result<WasteListing, AppError> {
        let created = self.listings.create(listing).await?;

        if let Err(e) = self.users.increment_waste_listed(created.owner_id).await {
            warn!(error = %e, user_id = created.owner_id, "Failed to update listing counter");
        }

        info!(waste_id = created.id, owner_id = created.owner_id, "Waste listing created");
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no listing has this id.
    pub async fn get(&self, id: i64) -> Result<WasteListing, AppError> {
        self.listings
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    /// Updates a listing's status on behalf of `caller_id`.
    ///
    /// Only the owner, the assigned collector or the assigned recycler may
    /// update. Moving to `collected` assigns the caller as collector; moving
    /// to `processing` or `recycled` assigns the caller as recycler.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the listing does not exist.
    /// Returns [`AppError::Forbidden`] if the caller is not a participant.
    pub async fn update_status(
        &self,
        id: i64,
        caller_id: i64,
        status: WasteStatus,
        notes: Option<String>,
    ) -> Result<WasteListing, AppError> {
        let listing = self.get(id).await?;

        if !listing.is_participant(caller_id) {
            return Err(AppError::forbidden(
                "Not authorized to update this waste listing",
            ));
        }

        let change = StatusChange {
            status,
            notes,
            collector_id: (status == WasteStatus::Collected).then_some(caller_id),
            recycler_id: matches!(status, WasteStatus::Processing | WasteStatus::Recycled)
                .then_some(caller_id),
        };

        let updated = self
            .listings
            .update_status(id, change)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

        info!(waste_id = id, user_id = caller_id, status = status.as_str(), "Waste status updated");
        Ok(updated)
    }

    pub async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<WasteListing>, AppError> {
        self.listings.list_by_owner(owner_id).await
    }

    /// Searches listings. A blank query is treated as no query.
    pub async fn search(&self, mut filter: WasteSearch) -> Result<Vec<WasteListing>, AppError> {
        filter.query = filter
            .query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        self.listings.search(filter).await
    }
}
