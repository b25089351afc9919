//! Destination catalog and profile-matched recommendations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use concierge_common::destination::NewDestination;
use concierge_common::{rank_recommendations, Destination, Recommendation, RecommendationKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;
use crate::db::destinations::{self, DestinationFilter};
use crate::db::profiles;
use crate::{ApiError, ApiResult, AppState};

const DEFAULT_DESTINATION_LIMIT: usize = 10;
const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct DestinationQuery {
    pub limit: Option<usize>,
    pub country: Option<String>,
    /// Comma separated
    #[serde(alias = "culturalTags")]
    pub cultural_tags: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    #[serde(rename = "type")]
    pub kind: Option<RecommendationKind>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DestinationsResponse {
    pub destinations: Vec<Destination>,
}

#[derive(Debug, Serialize)]
pub struct DestinationResponse {
    pub destination: Destination,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
}

fn split_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// GET /api/cultural/destinations
pub async fn list_destinations(
    State(state): State<AppState>,
    _user: UserId,
    Query(query): Query<DestinationQuery>,
) -> ApiResult<Json<DestinationsResponse>> {
    let filter = DestinationFilter {
        country: query.country,
        cultural_tags: split_tags(query.cultural_tags.as_deref()),
        limit: query.limit.unwrap_or(DEFAULT_DESTINATION_LIMIT),
    };

    let destinations = destinations::list_destinations(&state.db, &filter).await?;
    Ok(Json(DestinationsResponse { destinations }))
}

/// GET /api/cultural/destinations/:id
pub async fn get_destination(
    State(state): State<AppState>,
    _user: UserId,
    Path(id): Path<String>,
) -> ApiResult<Json<DestinationResponse>> {
    let not_found = || ApiError::NotFound("Destination not found".to_string());

    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let destination = destinations::get_destination(&state.db, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(DestinationResponse { destination }))
}

/// POST /api/cultural/destinations
pub async fn create_destination(
    State(state): State<AppState>,
    user: UserId,
    Json(new): Json<NewDestination>,
) -> ApiResult<(StatusCode, Json<DestinationResponse>)> {
    let destination = Destination::create(user.as_str(), new, Utc::now())?;
    destinations::insert_destination(&state.db, &destination).await?;

    tracing::info!(
        destination_id = %destination.id,
        name = %destination.name,
        user_id = user.as_str(),
        "Destination created"
    );

    Ok((StatusCode::CREATED, Json(DestinationResponse { destination })))
}

/// GET /api/cultural/recommendations
///
/// Recommendations curated on destinations tagged with the caller's
/// affinities or traits, best match first.
pub async fn get_recommendations(
    State(state): State<AppState>,
    user: UserId,
    Query(query): Query<RecommendationQuery>,
) -> ApiResult<Json<RecommendationsResponse>> {
    let profile = profiles::load_profile(&state.db, user.as_str())
        .await?
        .filter(|profile| profile.completed_onboarding)
        .ok_or_else(|| ApiError::BadRequest("Please complete your cultural profile first".to_string()))?;

    let limit = query.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
    let filter = DestinationFilter {
        country: None,
        cultural_tags: profile.matching_tags(),
        limit,
    };
    let destinations = destinations::list_destinations(&state.db, &filter).await?;

    let recommendations: Vec<Recommendation> = destinations
        .iter()
        .flat_map(Destination::annotated_recommendations)
        .filter(|rec| query.kind.map_or(true, |kind| rec.kind == kind))
        .collect();

    Ok(Json(RecommendationsResponse {
        recommendations: rank_recommendations(recommendations, limit),
    }))
}

pub fn destination_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/cultural/destinations",
            get(list_destinations).post(create_destination),
        )
        .route("/api/cultural/destinations/:id", get(get_destination))
        .route("/api/cultural/recommendations", get(get_recommendations))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tags() {
        assert_eq!(
            split_tags(Some("Nordic Design, Indie Culture,,")),
            vec!["Nordic Design", "Indie Culture"]
        );
        assert!(split_tags(Some(" ")).is_empty());
        assert!(split_tags(None).is_empty());
    }
}
