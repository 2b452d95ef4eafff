//! Waste listing entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Material category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteType {
    Organic,
    Plastic,
    Metal,
    Electronic,
    Paper,
    Glass,
    Other,
}

impl WasteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteType::Organic => "organic",
            WasteType::Plastic => "plastic",
            WasteType::Metal => "metal",
            WasteType::Electronic => "electronic",
            WasteType::Paper => "paper",
            WasteType::Glass => "glass",
            WasteType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "organic" => Some(WasteType::Organic),
            "plastic" => Some(WasteType::Plastic),
            "metal" => Some(WasteType::Metal),
            "electronic" => Some(WasteType::Electronic),
            "paper" => Some(WasteType::Paper),
            "glass" => Some(WasteType::Glass),
            "other" => Some(WasteType::Other),
            _ => None,
        }
    }
}

/// When the material can be picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Immediate,
    Scheduled,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Immediate => "immediate",
            Availability::Scheduled => "scheduled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "immediate" => Some(Availability::Immediate),
            "scheduled" => Some(Availability::Scheduled),
            _ => None,
        }
    }
}

/// Listing status. Only a label: no transition rules are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteStatus {
    #[default]
    Available,
    Pending,
    Collected,
    Processing,
    Recycled,
}

impl WasteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteStatus::Available => "available",
            WasteStatus::Pending => "pending",
            WasteStatus::Collected => "collected",
            WasteStatus::Processing => "processing",
            WasteStatus::Recycled => "recycled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(WasteStatus::Available),
            "pending" => Some(WasteStatus::Pending),
            "collected" => Some(WasteStatus::Collected),
            "processing" => Some(WasteStatus::Processing),
            "recycled" => Some(WasteStatus::Recycled),
            _ => None,
        }
    }
}

/// A listing of reusable material.
#[derive(Debug, Clone)]
pub struct WasteListing {
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

impl WasteListing {
    /// Returns true if the user owns, collects or recycles this listing.
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.owner_id == user_id
            || self.collector_id == Some(user_id)
            || self.recycler_id == Some(user_id)
    }
}

/// Input data for creating a listing.
#[derive(Debug, Clone)]
pub struct NewWasteListing {
    pub title: String,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub waste_type: WasteType,
    pub location: String,
    pub availability: Availability,
    pub scheduled_date: Option<String>,
    pub image_url: Option<String>,
    pub owner_id: i64,
}

/// Status update for an existing listing.
///
/// `collector_id` / `recycler_id` are only written when `Some`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: WasteStatus,
    pub notes: Option<String>,
    pub collector_id: Option<i64>,
    pub recycler_id: Option<i64>,
}

/// Search filters. All are optional and combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WasteSearch {
    /// Case-insensitive substring matched against title or description.
    pub query: Option<String>,
    pub waste_type: Option<WasteType>,
    pub status: Option<WasteStatus>,
}
