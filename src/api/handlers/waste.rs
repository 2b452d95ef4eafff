//! Handlers for waste listing endpoints. All require authentication.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::waste::{
    CreateWasteRequest, SearchParams, UpdateStatusRequest, WasteEnvelope, WasteListEnvelope,
};
use crate::api::extract::ApiJson;
use crate::application::services::AuthenticatedUser;
use crate::domain::entities::WasteSearch;
use crate::error::AppError;
use crate::state::AppState;

/// Ids that do not parse cannot name a listing.
fn listing_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::not_found("Waste listing not found"))
}

/// Lists material for collection.
///
/// # Endpoint
///
/// `POST /api/waste`
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Copper wire",
///   "description": "Offcuts from an electrical refit",
///   "quantity": 40,
///   "unit": "kg",
///   "wasteType": "metal",
///   "location": "Dock 3",
///   "availability": "immediate"
/// }
/// ```
pub async fn create_waste_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    ApiJson(payload): ApiJson<CreateWasteRequest>,
) -> Result<(StatusCode, Json<WasteEnvelope>), AppError> {
    payload.validate()?;

    let listing = state
        .waste_service
        .create(payload.into_new_listing(caller.id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(WasteEnvelope {
            success: true,
            data: listing.into(),
        }),
    ))
}

/// `GET /api/waste/{id}`
pub async fn get_waste_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WasteEnvelope>, AppError> {
    let listing = state.waste_service.get(listing_id(&id)?).await?;

    Ok(Json(WasteEnvelope {
        success: true,
        data: listing.into(),
    }))
}

/// Moves a listing through its lifecycle.
///
/// # Endpoint
///
/// `PATCH /api/waste/{id}/status`
///
/// # Errors
///
/// Returns 403 if the caller is neither owner, collector nor recycler.
pub async fn update_status_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> Result<Json<WasteEnvelope>, AppError> {
    payload.validate()?;

    let listing = state
        .waste_service
        .update_status(listing_id(&id)?, caller.id, payload.status, payload.notes)
        .await?;

    Ok(Json(WasteEnvelope {
        success: true,
        data: listing.into(),
    }))
}

/// `GET /api/waste/user` - the caller's own listings, newest first.
pub async fn user_waste_handler(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Json<WasteListEnvelope>, AppError> {
    let listings = state.waste_service.list_for_owner(caller.id).await?;
    Ok(Json(listings.into()))
}

/// Searches listings.
///
/// # Endpoint
///
/// `GET /api/waste/search?query=copper&type=metal&status=available`
pub async fn search_waste_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<WasteListEnvelope>, AppError> {
    let filter = WasteSearch::try_from(params)?;
    let listings = state.waste_service.search(filter).await?;
    Ok(Json(listings.into()))
}
