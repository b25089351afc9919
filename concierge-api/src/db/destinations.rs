//! Destination catalog persistence

use concierge_common::{Destination, Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{format_timestamp, from_json, parse_timestamp, retry_on_lock, to_json, MAX_LOCK_WAIT_MS};

const DESTINATION_COLUMNS: &str = "id, user_id, name, country, description, image_url, highlights, \
     recommendations, coordinates, cultural_tags, is_active, created_at, last_updated";

/// Listing criteria; empty fields don't filter
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationFilter {
    /// Case-insensitive substring of the country
    pub country: Option<String>,
    /// Destination must carry at least one of these
    pub cultural_tags: Vec<String>,
    pub limit: usize,
}

impl Default for DestinationFilter {
    fn default() -> Self {
        Self {
            country: None,
            cultural_tags: Vec::new(),
            limit: 10,
        }
    }
}

/// Active destinations matching `filter`, newest first
pub async fn list_destinations(pool: &SqlitePool, filter: &DestinationFilter) -> Result<Vec<Destination>> {
    let country = filter
        .country
        .as_deref()
        .map(str::trim)
        .filter(|country| !country.is_empty());

    let tags = if filter.cultural_tags.is_empty() {
        None
    } else {
        Some(to_json(&filter.cultural_tags)?)
    };
    let limit = i64::try_from(filter.limit).unwrap_or(i64::MAX);

    // Tag match is any-of, exact on the stored JSON array elements
    let rows = sqlx::query(&format!(
        r#"
        SELECT {}
        FROM destinations
        WHERE is_active = 1
          AND (?1 IS NULL OR instr(lower(country), lower(?1)) > 0)
          AND (?2 IS NULL OR EXISTS (
                SELECT 1
                FROM json_each(destinations.cultural_tags) AS stored, json_each(?2) AS wanted
                WHERE stored.value = wanted.value
          ))
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?3
        "#,
        DESTINATION_COLUMNS
    ))
    .bind(country)
    .bind(tags)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(destination_from_row).collect()
}

pub async fn get_destination(pool: &SqlitePool, id: Uuid) -> Result<Option<Destination>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM destinations WHERE id = ?",
        DESTINATION_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|row| destination_from_row(&row)).transpose()
}

pub async fn insert_destination(pool: &SqlitePool, destination: &Destination) -> Result<()> {
    let id = destination.id.to_string();
    let highlights = to_json(&destination.highlights)?;
    let recommendations = to_json(&destination.recommendations)?;
    let coordinates = destination.coordinates.as_ref().map(to_json).transpose()?;
    let cultural_tags = to_json(&destination.cultural_tags)?;
    let created_at = format_timestamp(&destination.created_at);
    let last_updated = format_timestamp(&destination.last_updated);

    retry_on_lock("insert_destination", MAX_LOCK_WAIT_MS, || async {
        sqlx::query(&format!(
            "INSERT INTO destinations ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            DESTINATION_COLUMNS
        ))
        .bind(&id)
        .bind(&destination.user_id)
        .bind(&destination.name)
        .bind(&destination.country)
        .bind(&destination.description)
        .bind(&destination.image_url)
        .bind(&highlights)
        .bind(&recommendations)
        .bind(&coordinates)
        .bind(&cultural_tags)
        .bind(destination.is_active)
        .bind(&created_at)
        .bind(&last_updated)
        .execute(pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    })
    .await
}

fn destination_from_row(row: &SqliteRow) -> Result<Destination> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Failed to parse destination id: {}", e)))?;
    let coordinates: Option<&str> = row.get("coordinates");

    Ok(Destination {
        id,
        user_id: row.get("user_id"),
        name: row.get("name"),
        country: row.get("country"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        highlights: from_json("highlights", row.get("highlights"))?,
        recommendations: from_json("recommendations", row.get("recommendations"))?,
        coordinates: coordinates
            .map(|value| from_json("coordinates", value))
            .transpose()?,
        cultural_tags: from_json("cultural_tags", row.get("cultural_tags"))?,
        is_active: row.get("is_active"),
        created_at: parse_timestamp("created_at", row.get("created_at"))?,
        last_updated: parse_timestamp("last_updated", row.get("last_updated"))?,
    })
}
