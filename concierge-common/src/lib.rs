//! # Concierge Common Library
//!
//! Shared code for the Cultural Concierge service including:
//! - Preference normalization and merging
//! - Analytics event model and metrics rollup
//! - Cultural profile and destination data model
//! - Configuration loading
//! - Common error type

pub mod analytics;
pub mod config;
pub mod destination;
pub mod error;
pub mod preferences;
pub mod profile;

pub use analytics::{compute_metrics, compute_realtime, AnalyticsEvent, AnalyticsMetrics, AnalyticsWindow, EventType};
pub use destination::{rank_recommendations, Destination, Recommendation, RecommendationKind};
pub use error::{Error, Result};
pub use preferences::{merge, normalize, PreferenceSet};
pub use profile::{CulturalContext, CulturalProfile, ProfileInsights, TasteConnection};
