//! Cultural profile persistence
//!
//! One row per user; the whole profile is rewritten on every save.

use chrono::Utc;
use concierge_common::{CulturalProfile, Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{format_timestamp, from_json, parse_timestamp, retry_on_lock, to_json, MAX_LOCK_WAIT_MS};

const PROFILE_COLUMNS: &str = "id, user_id, preferences, taste_map, taste_data, personality_traits, \
     cultural_affinities, completed_onboarding, last_updated, created_at";

/// Load the profile of `user_id`, if any
pub async fn load_profile(pool: &SqlitePool, user_id: &str) -> Result<Option<CulturalProfile>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM cultural_profiles WHERE user_id = ?",
        PROFILE_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| profile_from_row(&row)).transpose()
}

/// Load the profile of `user_id`, storing a default one first if missing
pub async fn load_or_create_profile(pool: &SqlitePool, user_id: &str) -> Result<CulturalProfile> {
    if let Some(profile) = load_profile(pool, user_id).await? {
        return Ok(profile);
    }

    let profile = CulturalProfile::new_for(user_id, Utc::now());
    // A concurrent request may have created it meanwhile; keep whichever landed first
    insert_profile(pool, &profile, true).await?;
    tracing::info!(user_id, "Created default cultural profile");

    load_profile(pool, user_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Profile for {} vanished after insert", user_id)))
}

/// Insert or fully overwrite the profile row of `profile.user_id`
pub async fn save_profile(pool: &SqlitePool, profile: &CulturalProfile) -> Result<()> {
    insert_profile(pool, profile, false).await
}

async fn insert_profile(pool: &SqlitePool, profile: &CulturalProfile, keep_existing: bool) -> Result<()> {
    // Prepare all data before touching the database
    let id = profile.id.to_string();
    let preferences = to_json(&profile.preferences)?;
    let taste_map = to_json(&profile.taste_map)?;
    let taste_data = to_json(&profile.taste_data)?;
    let personality_traits = to_json(&profile.personality_traits)?;
    let cultural_affinities = to_json(&profile.cultural_affinities)?;
    let last_updated = format_timestamp(&profile.last_updated);
    let created_at = format_timestamp(&profile.created_at);

    let conflict = if keep_existing {
        "DO NOTHING"
    } else {
        r#"DO UPDATE SET
            preferences = excluded.preferences,
            taste_map = excluded.taste_map,
            taste_data = excluded.taste_data,
            personality_traits = excluded.personality_traits,
            cultural_affinities = excluded.cultural_affinities,
            completed_onboarding = excluded.completed_onboarding,
            last_updated = excluded.last_updated"#
    };
    let sql = format!(
        "INSERT INTO cultural_profiles ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(user_id) {}",
        PROFILE_COLUMNS, conflict
    );

    retry_on_lock("save_profile", MAX_LOCK_WAIT_MS, || async {
        sqlx::query(&sql)
            .bind(&id)
            .bind(&profile.user_id)
            .bind(&preferences)
            .bind(&taste_map)
            .bind(&taste_data)
            .bind(&personality_traits)
            .bind(&cultural_affinities)
            .bind(profile.completed_onboarding)
            .bind(&last_updated)
            .bind(&created_at)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    })
    .await
}

fn profile_from_row(row: &SqliteRow) -> Result<CulturalProfile> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Failed to parse profile id: {}", e)))?;

    Ok(CulturalProfile {
        id,
        user_id: row.get("user_id"),
        preferences: from_json("preferences", row.get("preferences"))?,
        taste_map: from_json("taste_map", row.get("taste_map"))?,
        taste_data: from_json("taste_data", row.get("taste_data"))?,
        personality_traits: from_json("personality_traits", row.get("personality_traits"))?,
        cultural_affinities: from_json("cultural_affinities", row.get("cultural_affinities"))?,
        completed_onboarding: row.get("completed_onboarding"),
        last_updated: parse_timestamp("last_updated", row.get("last_updated"))?,
        created_at: parse_timestamp("created_at", row.get("created_at"))?,
    })
}
