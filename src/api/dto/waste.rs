//! DTOs for waste listing endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{
    Availability, NewWasteListing, WasteListing, WasteSearch, WasteStatus, WasteType,
};
use crate::error::AppError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWasteRequest {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,

    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,

    #[validate(range(exclusive_min = 0.0, message = "Quantity must be positive"))]
    pub quantity: f64,

    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,

    pub waste_type: WasteType,

    #[validate(length(min = 3, message = "Location is required"))]
    pub location: String,

    pub availability: Availability,
    pub scheduled_date: Option<String>,

    #[validate(length(max = 2048, message = "Image URL is too long"))]
    pub image_url: Option<String>,
}

impl CreateWasteRequest {
    pub fn into_new_listing(self, owner_id: i64) -> NewWasteListing {
        NewWasteListing {
            title: self.title,
            description: self.description,
            quantity: self.quantity,
            unit: self.unit,
            waste_type: self.waste_type,
            location: self.location,
            availability: self.availability,
            scheduled_date: self.scheduled_date.filter(|d| !d.trim().is_empty()),
            image_url: self.image_url.filter(|u| !u.trim().is_empty()),
            owner_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: WasteStatus,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Query string of `GET /api/waste/search`.
///
/// Enum filters arrive as raw strings so a bad value yields a JSON error.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    #[serde(rename = "type")]
    pub waste_type: Option<String>,
    pub status: Option<String>,
}

impl TryFrom<SearchParams> for WasteSearch {
    type Error = AppError;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let waste_type = non_empty(params.waste_type)
            .map(|t| {
                WasteType::parse(t.trim())
                    .ok_or_else(|| AppError::bad_request(format!("Invalid waste type: {t}")))
            })
            .transpose()?;

        let status = non_empty(params.status)
            .map(|s| {
                WasteStatus::parse(s.trim())
                    .ok_or_else(|| AppError::bad_request(format!("Invalid status: {s}")))
            })
            .transpose()?;

        Ok(WasteSearch {
            query: non_empty(params.query),
            waste_type,
            status,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub waste_type: WasteType,
    pub location: String,
    pub availability: Availability,
    pub scheduled_date: Option<String>,
    pub image_url: Option<String>,
    pub status: WasteStatus,
    pub notes: Option<String>,
    pub owner_id: i64,
    pub collector_id: Option<i64>,
    pub recycler_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WasteListing> for WasteResponse {
    fn from(w: WasteListing) -> Self {
        WasteResponse {
            id: w.id,
            title: w.title,
            description: w.description,
            quantity: w.quantity,
            unit: w.unit,
            waste_type: w.waste_type,
            location: w.location,
            availability: w.availability,
            scheduled_date: w.scheduled_date,
            image_url: w.image_url,
            status: w.status,
            notes: w.notes,
            owner_id: w.owner_id,
            collector_id: w.collector_id,
            recycler_id: w.recycler_id,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WasteEnvelope {
    pub success: bool,
    pub data: WasteResponse,
}

#[derive(Debug, Serialize)]
pub struct WasteListEnvelope {
    pub success: bool,
    pub count: usize,
    pub data: Vec<WasteResponse>,
}

impl From<Vec<WasteListing>> for WasteListEnvelope {
    fn from(listings: Vec<WasteListing>) -> Self {
        WasteListEnvelope {
            success: true,
            count: listings.len(),
            data: listings.into_iter().map(WasteResponse::from).collect(),
        }
    }
}
