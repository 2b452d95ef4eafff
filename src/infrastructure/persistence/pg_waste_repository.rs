//! PostgreSQL implementation of waste listing repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{
    Availability, NewWasteListing, StatusChange, WasteListing, WasteSearch, WasteStatus,
    WasteType,
};
use crate::domain::repositories::WasteRepository;
use crate::error::AppError;

const WASTE_COLUMNS: &str = "id, title, description, quantity, unit, waste_type, location, \
     availability, scheduled_date, image_url, status, notes, owner_id, collector_id, recycler_id, \
     created_at, updated_at";

/// Upper bound on rows returned by a search.
const SEARCH_LIMIT: i64 = 100;

#[derive(FromRow)]
struct WasteRow {
    id: i64,
    title: String,
    description: String,
    quantity: f64,
    unit: String,
    waste_type: String,
    location: String,
    availability: String,
    scheduled_date: Option<String>,
    image_url: Option<String>,
    status: String,
    notes: Option<String>,
    owner_id: i64,
    collector_id: Option<i64>,
    recycler_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn unknown(column: &str, value: &str) -> AppError {
    AppError::internal(format!("Unknown {column} '{value}' in waste_listings table"))
}

impl TryFrom<WasteRow> for WasteListing {
    type Error = AppError;

    fn try_from(row: WasteRow) -> Result<Self, Self::Error> {
        let waste_type =
            WasteType::parse(&row.waste_type).ok_or_else(|| unknown("waste_type", &row.waste_type))?;
        let availability = Availability::parse(&row.availability)
            .ok_or_else(|| unknown("availability", &row.availability))?;
        let status = WasteStatus::parse(&row.status).ok_or_else(|| unknown("status", &row.status))?;

        Ok(WasteListing {
            id: row.id,
            title: row.title,
            description: row.description,
            quantity: row.quantity,
            unit: row.unit,
            waste_type,
            location: row.location,
            availability,
            scheduled_date: row.scheduled_date,
            image_url: row.image_url,
            status,
            notes: row.notes,
            owner_id: row.owner_id,
            collector_id: row.collector_id,
            recycler_id: row.recycler_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_listings(rows: Vec<WasteRow>) -> Result<Vec<WasteListing>, AppError> {
    rows.into_iter().map(WasteListing::try_from).collect()
}

/// Escapes `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// PostgreSQL repository for waste listings.
pub struct PgWasteRepository {
    pool: Arc<PgPool>,
}

impl PgWasteRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WasteRepository for PgWasteRepository {
    async fn create(&self, listing: NewWasteListing) -> Result<WasteListing, AppError> {
        let row = sqlx::query_as::<_, WasteRow>(&format!(
            r#"
            INSERT INTO waste_listings
                (title, description, quantity, unit, waste_type, location,
                 availability, scheduled_date, image_url, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {WASTE_COLUMNS}
            "#
        ))
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.quantity)
        .bind(&listing.unit)
        .bind(listing.waste_type.as_str())
        .bind(&listing.location)
        .bind(listing.availability.as_str())
        .bind(&listing.scheduled_date)
        .bind(&listing.image_url)
        .bind(listing.owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        WasteListing::try_from(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<WasteListing>, AppError> {
        let row = sqlx::query_as::<_, WasteRow>(&format!(
            "SELECT {WASTE_COLUMNS} FROM waste_listings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(WasteListing::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: i64,
        change: StatusChange,
    ) -> Result<Option<WasteListing>, AppError> {
        let row = sqlx::query_as::<_, WasteRow>(&format!(
            r#"
            UPDATE waste_listings
            SET status = $2,
                notes = COALESCE($3, notes),
                collector_id = COALESCE($4, collector_id),
                recycler_id = COALESCE($5, recycler_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {WASTE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(change.status.as_str())
        .bind(&change.notes)
        .bind(change.collector_id)
        .bind(change.recycler_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(WasteListing::try_from).transpose()
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<WasteListing>, AppError> {
        let rows = sqlx::query_as::<_, WasteRow>(&format!(
            "SELECT {WASTE_COLUMNS} FROM waste_listings WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        into_listings(rows)
    }

    async fn search(&self, filter: WasteSearch) -> Result<Vec<WasteListing>, AppError> {
        let pattern = filter.query.as_deref().map(|q| format!("%{}%", escape_like(q)));

        let rows = sqlx::query_as::<_, WasteRow>(&format!(
            r#"
            SELECT {WASTE_COLUMNS}
            FROM waste_listings
            WHERE ($1::text IS NULL
                   OR title ILIKE $1 ESCAPE '\'
                   OR description ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR waste_type = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#
        ))
        .bind(pattern)
        .bind(filter.waste_type.map(|t| t.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(SEARCH_LIMIT)
        .fetch_all(self.pool.as_ref())
        .await?;

        into_listings(rows)
    }
}
