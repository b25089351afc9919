//! Qloo taste graph client

use async_trait::async_trait;
use concierge_common::config::QlooSettings;
use concierge_common::{CulturalContext, CulturalProfile, PreferenceSet, TasteConnection};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use super::{
    check_status, http_client, DestinationSuggestion, ServiceError, ServiceResult, TasteGraph,
    TasteProfile, TasteRecommendation,
};

const SERVICE_NAME: &str = "Qloo";
const DEFAULT_CULTURAL_MATCH: f64 = 0.8;
const DEFAULT_REASONING: &str = "Recommended based on your cultural profile";

/// One weighted taste input, as the taste graph expects it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TasteInput {
    #[serde(rename = "type")]
    pub domain: String,
    pub name: String,
    pub weight: f64,
}

/// Flatten a preference set into equally weighted inputs
pub fn format_inputs(preferences: &PreferenceSet) -> Vec<TasteInput> {
    preferences
        .iter()
        .flat_map(|(domain, labels)| {
            labels.iter().map(move |label| TasteInput {
                domain: domain.to_string(),
                name: label.clone(),
                weight: 1.0,
            })
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireTasteProfile {
    taste_vectors: Map<String, Value>,
    cultural_dimensions: BTreeMap<String, f64>,
    personality_traits: Vec<String>,
    cultural_affinities: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireResults {
    results: Vec<WireRecommendation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireRecommendation {
    id: Value,
    name: String,
    description: String,
    cultural_match: Option<f64>,
    metadata: Option<Value>,
    reasoning: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireConnections {
    connections: Vec<WireConnection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireConnection {
    source: String,
    target: String,
    strength: f64,
    connection_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireDestinations {
    destinations: Vec<WireDestination>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireDestination {
    name: String,
    country: String,
    cultural_match: f64,
    description: String,
    cultural_highlights: Vec<String>,
    local_recommendations: Vec<Value>,
}

/// [`TasteGraph`] backed by the Qloo API
pub struct QlooClient {
    http_client: reqwest::Client,
    settings: QlooSettings,
}

impl QlooClient {
    pub fn new(settings: QlooSettings) -> ServiceResult<Self> {
        Ok(Self {
            http_client: http_client()?,
            settings,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    async fn post<T: serde::de::DeserializeOwned>(&self, path: &str, body: Value) -> ServiceResult<T> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ServiceError::NotConfigured(SERVICE_NAME))?;

        let url = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);
        tracing::debug!(url = %url, "Querying taste graph");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl TasteGraph for QlooClient {
    async fn taste_profile(&self, preferences: &PreferenceSet) -> ServiceResult<TasteProfile> {
        let body = json!({
            "inputs": format_inputs(preferences),
            "options": { "include_metadata": true, "max_results": 50 },
        });
        let wire: WireTasteProfile = self.post("/taste/profile", body).await?;

        Ok(TasteProfile {
            taste_vectors: wire.taste_vectors,
            cultural_dimensions: wire.cultural_dimensions,
            personality_traits: wire.personality_traits,
            cultural_affinities: wire.cultural_affinities,
        })
    }

    async fn recommendations(
        &self,
        profile: &CulturalProfile,
        category: &str,
        location: Option<&str>,
    ) -> ServiceResult<Vec<TasteRecommendation>> {
        let body = json!({
            "taste_profile": CulturalContext::from(profile),
            "category": category,
            "options": { "max_results": 10, "include_metadata": true, "location": location },
        });
        let wire: WireResults = self.post("/recommendations", body).await?;
        Ok(parse_recommendations(wire, category))
    }

    async fn cultural_connections(
        &self,
        preferences: &PreferenceSet,
    ) -> ServiceResult<Vec<TasteConnection>> {
        let body = json!({
            "inputs": format_inputs(preferences),
            "options": {
                "connection_types": ["cross_domain", "cultural_affinity"],
                "strength_threshold": 0.6,
            },
        });
        let wire: WireConnections = self.post("/taste/connections", body).await?;

        Ok(wire
            .connections
            .into_iter()
            .map(|conn| TasteConnection::new(conn.source, conn.target, conn.strength, conn.connection_type))
            .collect())
    }

    async fn destination_recommendations(
        &self,
        profile: &CulturalProfile,
        travel_preferences: &[String],
    ) -> ServiceResult<Vec<DestinationSuggestion>> {
        let body = json!({
            "cultural_profile": CulturalContext::from(profile),
            "travel_style": travel_preferences,
            "options": {
                "max_results": 5,
                "include_cultural_match": true,
                "include_local_recommendations": true,
            },
        });
        let wire: WireDestinations = self.post("/travel/destinations", body).await?;

        Ok(wire
            .destinations
            .into_iter()
            .map(|dest| DestinationSuggestion {
                name: dest.name,
                country: dest.country,
                cultural_match: dest.cultural_match,
                description: dest.description,
                highlights: dest.cultural_highlights,
                local_recommendations: dest.local_recommendations,
            })
            .collect())
    }
}

fn parse_recommendations(wire: WireResults, category: &str) -> Vec<TasteRecommendation> {
    wire.results
        .into_iter()
        .map(|item| TasteRecommendation {
            id: match item.id {
                Value::String(id) => id,
                Value::Null => String::new(),
                other => other.to_string(),
            },
            name: item.name,
            description: item.description,
            category: category.to_string(),
            cultural_match: item.cultural_match.unwrap_or(DEFAULT_CULTURAL_MATCH),
            metadata: item.metadata.unwrap_or_else(|| Value::Object(Map::new())),
            reasoning: item
                .reasoning
                .unwrap_or_else(|| DEFAULT_REASONING.to_string()),
        })
        .collect()
}
