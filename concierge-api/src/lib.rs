//! concierge-api library
//!
//! Single HTTP service for the Cultural Concierge: cultural profiles,
//! destinations, AI-backed recommendations and analytics.

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::services::{ConciergeModel, TasteGraph};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Language model used for chat, extraction and analysis
    pub model: Arc<dyn ConciergeModel>,
    /// Taste graph used for connections and recommendations
    pub taste: Arc<dyn TasteGraph>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last upstream error, reported by the health endpoint
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, model: Arc<dyn ConciergeModel>, taste: Arc<dyn TasteGraph>) -> Self {
        Self {
            db,
            model,
            taste,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember an upstream failure for diagnostics
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::profile_routes())
        .merge(api::destination_routes())
        .merge(api::ai_routes())
        .merge(api::analytics_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
