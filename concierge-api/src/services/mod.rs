//! AI collaborators
//!
//! The language model and the taste graph sit behind traits so the router can
//! be driven with stubs in tests. Clients are built once in `main` and handed
//! to [`AppState`](crate::AppState).

pub mod fallback;
pub mod openai_client;
pub mod qloo_client;

pub use fallback::FallbackTasteGraph;
pub use openai_client::OpenAiClient;
pub use qloo_client::QlooClient;

use async_trait::async_trait;
use concierge_common::{
    CulturalContext, CulturalProfile, PreferenceSet, ProfileInsights, Recommendation,
    RecommendationKind, TasteConnection,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

const USER_AGENT: &str = concat!("concierge-api/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors from the external AI services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// No API key configured for the named service
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// One turn of the onboarding conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Language model used for conversation and profile analysis
#[async_trait]
pub trait ConciergeModel: Send + Sync {
    /// Short conversational reply informed by the user's cultural context
    async fn chat_reply(&self, message: &str, context: &CulturalContext) -> ServiceResult<String>;

    /// Pull per-category preferences out of a conversation
    async fn extract_preferences(&self, history: &[ChatMessage]) -> ServiceResult<PreferenceSet>;

    /// Traits, affinities and cross-domain connections for a preference set
    async fn analyze_profile(&self, preferences: &PreferenceSet) -> ServiceResult<ProfileInsights>;

    /// Concrete places and experiences in `destination` for this profile
    async fn travel_recommendations(
        &self,
        profile: &CulturalProfile,
        destination: &str,
    ) -> ServiceResult<Vec<Recommendation>>;
}

/// Aggregate taste dimensions for a preference set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TasteProfile {
    pub taste_vectors: Map<String, Value>,
    pub cultural_dimensions: BTreeMap<String, f64>,
    pub personality_traits: Vec<String>,
    pub cultural_affinities: Vec<String>,
}

/// A taste-graph recommendation before it is shaped for the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasteRecommendation {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub cultural_match: f64,
    pub metadata: Value,
    pub reasoning: String,
}

impl TasteRecommendation {
    /// Shape into a [`Recommendation`] located at `location`
    pub fn into_recommendation(self, location: &str, tags: &[&str]) -> Recommendation {
        Recommendation {
            id: Some(self.id),
            kind: RecommendationKind::from_category(&self.category),
            title: self.name,
            description: self.description,
            location: location.to_string(),
            cultural_match: self.cultural_match,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            reasoning: self.reasoning,
            ..Default::default()
        }
    }
}

/// Destination the taste graph suggests for a traveller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationSuggestion {
    pub name: String,
    pub country: String,
    pub cultural_match: f64,
    pub description: String,
    pub highlights: Vec<String>,
    pub local_recommendations: Vec<Value>,
}

/// Cross-domain taste graph
#[async_trait]
pub trait TasteGraph: Send + Sync {
    async fn taste_profile(&self, preferences: &PreferenceSet) -> ServiceResult<TasteProfile>;

    /// Up to ten recommendations in `category`, optionally near `location`
    async fn recommendations(
        &self,
        profile: &CulturalProfile,
        category: &str,
        location: Option<&str>,
    ) -> ServiceResult<Vec<TasteRecommendation>>;

    async fn cultural_connections(
        &self,
        preferences: &PreferenceSet,
    ) -> ServiceResult<Vec<TasteConnection>>;

    async fn destination_recommendations(
        &self,
        profile: &CulturalProfile,
        travel_preferences: &[String],
    ) -> ServiceResult<Vec<DestinationSuggestion>>;
}

/// Shared HTTP client settings for both services
fn http_client() -> ServiceResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ServiceError::Network(e.to_string()))
}

/// Turn a non-success response into [`ServiceError::Api`]
async fn check_status(response: reqwest::Response) -> ServiceResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Api(status.as_u16(), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_taste_recommendation_shaping() {
        let rec = TasteRecommendation {
            id: "q1".into(),
            name: "Noma".into(),
            description: "New Nordic".into(),
            category: "restaurants".into(),
            cultural_match: 0.9,
            metadata: json!({}),
            reasoning: "Foraged ingredients".into(),
        }
        .into_recommendation("Copenhagen", &["Live", "Nearby"]);

        assert_eq!(rec.id.as_deref(), Some("q1"));
        assert_eq!(rec.kind, RecommendationKind::Restaurant);
        assert_eq!(rec.title, "Noma");
        assert_eq!(rec.location, "Copenhagen");
        assert_eq!(rec.tags, vec!["Live", "Nearby"]);
    }
}
