//! Analytics tracking and dashboards

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use concierge_common::analytics::RealtimeSnapshot;
use concierge_common::{
    compute_metrics, compute_realtime, AnalyticsEvent, AnalyticsMetrics, AnalyticsWindow, EventType,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{identity::event_origin, UserId};
use crate::db::events;
use crate::{ApiError, ApiResult, AppState};

/// Active users are counted over this many trailing hours regardless of window
const ACTIVE_USER_LOOKBACK_HOURS: i64 = 24;
const REALTIME_LOOKBACK_HOURS: i64 = 1;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    #[serde(alias = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(alias = "endDate")]
    pub end_date: Option<DateTime<Utc>>,
}

/// POST /api/analytics/track
///
/// Anonymous callers are accepted; the user id is recorded when present.
pub async fn track_event(
    State(state): State<AppState>,
    user: Option<UserId>,
    headers: HeaderMap,
    Json(request): Json<TrackRequest>,
) -> ApiResult<(StatusCode, Json<TrackResponse>)> {
    let event_type: EventType = request.event_type.parse()?;
    if request.action.trim().is_empty() {
        return Err(ApiError::BadRequest("action is required".to_string()));
    }
    if request.session_id.trim().is_empty() {
        return Err(ApiError::BadRequest("sessionId is required".to_string()));
    }

    let mut event = AnalyticsEvent::new(event_type, request.action, request.session_id, Utc::now());
    event.data = request.data;
    event.user_id = user.map(|user| user.0);

    events::insert_event_with_origin(&state.db, &event, &event_origin(&headers)).await?;

    tracing::debug!(
        event_type = %event.event_type,
        action = %event.action,
        session_id = %event.session_id,
        "Analytics event tracked"
    );

    Ok((
        StatusCode::CREATED,
        Json(TrackResponse {
            message: "Event tracked successfully".to_string(),
        }),
    ))
}

/// GET /api/analytics/metrics
///
/// Window defaults to the last 30 days.
pub async fn get_metrics(
    State(state): State<AppState>,
    _user: UserId,
    Query(query): Query<MetricsQuery>,
) -> ApiResult<Json<AnalyticsMetrics>> {
    let now = Utc::now();
    let window = AnalyticsWindow::resolve(query.start_date, query.end_date, now)?;

    let since = window
        .start
        .min(now - Duration::hours(ACTIVE_USER_LOOKBACK_HOURS));
    let events = events::events_since(&state.db, since).await?;

    Ok(Json(compute_metrics(&events, &window, now)))
}

/// GET /api/analytics/realtime
pub async fn get_realtime(
    State(state): State<AppState>,
    _user: UserId,
) -> ApiResult<Json<RealtimeSnapshot>> {
    let now = Utc::now();
    let events = events::events_since(&state.db, now - Duration::hours(REALTIME_LOOKBACK_HOURS)).await?;

    Ok(Json(compute_realtime(&events, now)))
}

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/track", post(track_event))
        .route("/api/analytics/metrics", get(get_metrics))
        .route("/api/analytics/realtime", get(get_realtime))
}
