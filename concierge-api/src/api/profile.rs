//! Cultural profile endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use concierge_common::profile::ProfileUpdate;
use concierge_common::CulturalProfile;
use serde::Serialize;

use super::UserId;
use crate::db::profiles;
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: CulturalProfile,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: String,
    pub profile: CulturalProfile,
}

/// GET /api/cultural/profile
///
/// First access stores and returns an empty profile.
pub async fn get_profile(
    State(state): State<AppState>,
    user: UserId,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = profiles::load_or_create_profile(&state.db, user.as_str()).await?;
    Ok(Json(ProfileResponse { profile }))
}

/// PUT /api/cultural/profile
///
/// Each supplied category replaces the stored list for that category.
pub async fn update_profile(
    State(state): State<AppState>,
    user: UserId,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<ProfileUpdatedResponse>> {
    let mut profile = profiles::load_or_create_profile(&state.db, user.as_str()).await?;
    profile.apply_update(update, Utc::now());
    profiles::save_profile(&state.db, &profile).await?;

    tracing::info!(user_id = user.as_str(), "Cultural profile updated");

    Ok(Json(ProfileUpdatedResponse {
        message: "Cultural profile updated successfully".to_string(),
        profile,
    }))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/api/cultural/profile", get(get_profile).put(update_profile))
}
