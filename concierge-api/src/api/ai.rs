//! AI-backed endpoints: chat, profile analysis and recommendations
//!
//! Language model failures are logged with their detail and recorded for the
//! health endpoint; clients only get a generic message.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use concierge_common::{
    rank_recommendations, CulturalContext, CulturalProfile, PreferenceSet, ProfileInsights,
    Recommendation,
};
use serde::{Deserialize, Serialize};

use super::UserId;
use crate::db::profiles;
use crate::services::{ChatMessage, DestinationSuggestion, ServiceResult, TasteProfile};
use crate::{ApiError, ApiResult, AppState};

/// Extraction starts once the conversation has this many prior turns
const EXTRACTION_MIN_HISTORY: usize = 2;
const TRAVEL_RECOMMENDATION_LIMIT: usize = 10;
const LIVE_RECOMMENDATION_LIMIT: usize = 5;
const LIVE_CATEGORIES: [&str; 4] = ["restaurants", "activities", "shopping", "music"];
const TRAVEL_TAGS: [&str; 2] = ["AI Recommended", "Qloo Powered"];
const LIVE_TAGS: [&str; 3] = ["Live", "Nearby", "AI Powered"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub extracted_preferences: Option<PreferenceSet>,
    pub conversation_length: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeProfileRequest {
    #[serde(default)]
    pub preferences: PreferenceSet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeProfileResponse {
    pub message: String,
    pub profile: CulturalProfile,
    pub ai_insights: ProfileInsights,
    pub taste_profile: TasteProfile,
}

#[derive(Debug, Deserialize)]
pub struct TravelRequest {
    #[serde(default)]
    pub destination: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelResponse {
    pub destination: String,
    pub recommendations: Vec<Recommendation>,
    pub total_recommendations: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationSuggestionsResponse {
    pub destinations: Vec<DestinationSuggestion>,
    pub based_on: CulturalContext,
}

#[derive(Debug, Deserialize)]
pub struct LiveRequest {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_live_category")]
    pub category: String,
}

fn default_live_category() -> String {
    "all".to_string()
}

#[derive(Debug, Serialize)]
pub struct LiveResponse {
    pub location: Option<String>,
    pub recommendations: Vec<Recommendation>,
    pub timestamp: DateTime<Utc>,
}

/// Log and record an upstream failure, then map it to an API error
async fn upstream<T>(state: &AppState, operation: &str, result: ServiceResult<T>) -> ApiResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::error!(operation, error = %e, "AI service call failed");
            state.record_error(format!("{}: {}", operation, e)).await;
            Err(ApiError::from(e))
        }
    }
}

/// Profile the caller must already have for recommendation endpoints
async fn require_profile(state: &AppState, user: &UserId) -> ApiResult<CulturalProfile> {
    profiles::load_profile(&state.db, user.as_str())
        .await?
        .ok_or_else(|| ApiError::BadRequest("Please complete your cultural profile first".to_string()))
}

/// POST /api/ai/chat
pub async fn chat(
    State(state): State<AppState>,
    user: UserId,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let context = profiles::load_profile(&state.db, user.as_str())
        .await?
        .map(|profile| CulturalContext::from(&profile))
        .unwrap_or_default();

    let reply = upstream(
        &state,
        "chat_reply",
        state.model.chat_reply(&request.message, &context).await,
    )
    .await?;

    let mut extracted_preferences = None;
    if request.conversation_history.len() >= EXTRACTION_MIN_HISTORY {
        let mut history = request.conversation_history.clone();
        history.push(ChatMessage::user(request.message.clone()));

        match state.model.extract_preferences(&history).await {
            Ok(preferences) => extracted_preferences = Some(preferences),
            Err(e) => tracing::warn!(error = %e, "Failed to extract preferences"),
        }
    }

    Ok(Json(ChatResponse {
        response: reply,
        extracted_preferences,
        conversation_length: request.conversation_history.len() + 1,
    }))
}

/// POST /api/ai/analyze-profile
///
/// Merges the submitted preferences into the stored profile and replaces
/// the derived insights.
pub async fn analyze_profile(
    State(state): State<AppState>,
    user: UserId,
    Json(request): Json<AnalyzeProfileRequest>,
) -> ApiResult<Json<AnalyzeProfileResponse>> {
    let preferences = request.preferences;

    let ai_insights = upstream(
        &state,
        "analyze_profile",
        state.model.analyze_profile(&preferences).await,
    )
    .await?;
    let taste_profile = upstream(
        &state,
        "taste_profile",
        state.taste.taste_profile(&preferences).await,
    )
    .await?;
    let connections = upstream(
        &state,
        "cultural_connections",
        state.taste.cultural_connections(&preferences).await,
    )
    .await?;

    let mut insights = ai_insights.clone();
    if insights.connections.is_none() {
        insights.connections = Some(connections);
    }

    let mut profile = profiles::load_or_create_profile(&state.db, user.as_str()).await?;
    profile.apply_insights(&preferences, &insights, Utc::now());
    profiles::save_profile(&state.db, &profile).await?;

    tracing::info!(
        user_id = user.as_str(),
        categories = profile.preferences.len(),
        labels = profile.preferences.label_count(),
        "Cultural profile analyzed and updated"
    );

    Ok(Json(AnalyzeProfileResponse {
        message: "Cultural profile analyzed and updated".to_string(),
        profile,
        ai_insights,
        taste_profile,
    }))
}

/// POST /api/ai/travel-recommendations
pub async fn travel_recommendations(
    State(state): State<AppState>,
    user: UserId,
    Json(request): Json<TravelRequest>,
) -> ApiResult<Json<TravelResponse>> {
    let destination = request.destination.trim().to_string();
    if destination.is_empty() {
        return Err(ApiError::BadRequest("Destination is required".to_string()));
    }
    let profile = require_profile(&state, &user).await?;

    let mut combined = upstream(
        &state,
        "travel_recommendations",
        state.model.travel_recommendations(&profile, &destination).await,
    )
    .await?;

    for category in ["restaurants", "activities"] {
        let picks = upstream(
            &state,
            "recommendations",
            state
                .taste
                .recommendations(&profile, category, Some(&destination))
                .await,
        )
        .await?;
        combined.extend(
            picks
                .into_iter()
                .map(|pick| pick.into_recommendation(&destination, &TRAVEL_TAGS)),
        );
    }

    let total_recommendations = combined.len();
    Ok(Json(TravelResponse {
        destination,
        recommendations: rank_recommendations(combined, TRAVEL_RECOMMENDATION_LIMIT),
        total_recommendations,
    }))
}

/// GET /api/ai/destination-suggestions
pub async fn destination_suggestions(
    State(state): State<AppState>,
    user: UserId,
) -> ApiResult<Json<DestinationSuggestionsResponse>> {
    let profile = require_profile(&state, &user).await?;
    let travel = profile.preferences.labels("travel").to_vec();

    let destinations = upstream(
        &state,
        "destination_recommendations",
        state.taste.destination_recommendations(&profile, &travel).await,
    )
    .await?;

    Ok(Json(DestinationSuggestionsResponse {
        destinations,
        based_on: CulturalContext::from(&profile),
    }))
}

/// POST /api/ai/live-recommendations
///
/// `category` "all" covers restaurants, activities, shopping and music.
pub async fn live_recommendations(
    State(state): State<AppState>,
    user: UserId,
    Json(request): Json<LiveRequest>,
) -> ApiResult<Json<LiveResponse>> {
    let profile = require_profile(&state, &user).await?;

    let categories: Vec<&str> = if request.category == "all" {
        LIVE_CATEGORIES.to_vec()
    } else {
        vec![request.category.as_str()]
    };
    let location = request.location.as_deref();

    let mut recommendations = Vec::new();
    for category in categories {
        let picks = upstream(
            &state,
            "recommendations",
            state.taste.recommendations(&profile, category, location).await,
        )
        .await?;
        recommendations.extend(
            picks
                .into_iter()
                .map(|pick| pick.into_recommendation(location.unwrap_or_default(), &LIVE_TAGS)),
        );
    }

    Ok(Json(LiveResponse {
        location: request.location.clone(),
        recommendations: rank_recommendations(recommendations, LIVE_RECOMMENDATION_LIMIT),
        timestamp: Utc::now(),
    }))
}

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai/chat", post(chat))
        .route("/api/ai/analyze-profile", post(analyze_profile))
        .route("/api/ai/travel-recommendations", post(travel_recommendations))
        .route("/api/ai/destination-suggestions", get(destination_suggestions))
        .route("/api/ai/live-recommendations", post(live_recommendations))
}
