//! Canned taste-graph answers for when the real service is unavailable

use async_trait::async_trait;
use concierge_common::{CulturalProfile, PreferenceSet, TasteConnection};
use serde_json::{json, Map};
use std::collections::BTreeMap;

use super::{DestinationSuggestion, ServiceResult, TasteGraph, TasteProfile, TasteRecommendation};

/// Wraps a [`TasteGraph`] and answers every failed call with canned data
///
/// Never returns an error.
pub struct FallbackTasteGraph<T> {
    inner: T,
}

impl<T: TasteGraph> FallbackTasteGraph<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: TasteGraph> TasteGraph for FallbackTasteGraph<T> {
    async fn taste_profile(&self, preferences: &PreferenceSet) -> ServiceResult<TasteProfile> {
        match self.inner.taste_profile(preferences).await {
            Ok(profile) => Ok(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Taste profile unavailable, using fallback");
                Ok(fallback_taste_profile())
            }
        }
    }

    async fn recommendations(
        &self,
        profile: &CulturalProfile,
        category: &str,
        location: Option<&str>,
    ) -> ServiceResult<Vec<TasteRecommendation>> {
        match self.inner.recommendations(profile, category, location).await {
            Ok(recommendations) => Ok(recommendations),
            Err(e) => {
                tracing::warn!(error = %e, category, "Taste recommendations unavailable, using fallback");
                Ok(fallback_recommendations(category))
            }
        }
    }

    async fn cultural_connections(
        &self,
        preferences: &PreferenceSet,
    ) -> ServiceResult<Vec<TasteConnection>> {
        match self.inner.cultural_connections(preferences).await {
            Ok(connections) => Ok(connections),
            Err(e) => {
                tracing::warn!(error = %e, "Cultural connections unavailable, using fallback");
                Ok(fallback_connections())
            }
        }
    }

    async fn destination_recommendations(
        &self,
        profile: &CulturalProfile,
        travel_preferences: &[String],
    ) -> ServiceResult<Vec<DestinationSuggestion>> {
        match self
            .inner
            .destination_recommendations(profile, travel_preferences)
            .await
        {
            Ok(destinations) => Ok(destinations),
            Err(e) => {
                tracing::warn!(error = %e, "Destination suggestions unavailable, using fallback");
                Ok(fallback_destinations())
            }
        }
    }
}

pub fn fallback_taste_profile() -> TasteProfile {
    TasteProfile {
        taste_vectors: Map::new(),
        cultural_dimensions: BTreeMap::from([
            ("authenticity".to_string(), 0.8),
            ("sophistication".to_string(), 0.7),
            ("creativity".to_string(), 0.9),
        ]),
        personality_traits: vec![
            "Authentic".to_string(),
            "Creative".to_string(),
            "Sophisticated".to_string(),
        ],
        cultural_affinities: vec![
            "Independent Culture".to_string(),
            "Artisan Communities".to_string(),
        ],
    }
}

/// Canned picks per category; unknown categories get nothing
pub fn fallback_recommendations(category: &str) -> Vec<TasteRecommendation> {
    let canned = |id: &str, name: &str, description: &str, cultural_match: f64, reasoning: &str| {
        TasteRecommendation {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            cultural_match,
            metadata: json!({}),
            reasoning: reasoning.to_string(),
        }
    };

    match category {
        "restaurants" => vec![canned(
            "fallback_1",
            "Local Artisan Eatery",
            "Farm-to-table restaurant with local ingredients",
            0.85,
            "Matches your preference for authentic, quality experiences",
        )],
        "music" => vec![canned(
            "fallback_2",
            "Indie Folk Venue",
            "Intimate venue featuring emerging artists",
            0.9,
            "Aligns with your indie music preferences",
        )],
        "activities" => vec![canned(
            "fallback_3",
            "Neighbourhood Design Walk",
            "Self-guided route through independent studios and galleries",
            0.8,
            "Follows your interest in craft and local creativity",
        )],
        "shopping" => vec![canned(
            "fallback_4",
            "Vintage and Maker Market",
            "Weekend market of local designers and second-hand finds",
            0.78,
            "Suits your taste for one-of-a-kind, sustainable pieces",
        )],
        _ => Vec::new(),
    }
}

pub fn fallback_connections() -> Vec<TasteConnection> {
    vec![TasteConnection::new("Indie Folk", "Nordic Cuisine", 0.85, "Music → Cuisine")]
}

pub fn fallback_destinations() -> Vec<DestinationSuggestion> {
    vec![DestinationSuggestion {
        name: "Copenhagen".to_string(),
        country: "Denmark".to_string(),
        cultural_match: 0.94,
        description: "Perfect blend of hygge culture and innovative design".to_string(),
        highlights: vec![
            "Nordic Design".to_string(),
            "Sustainable Living".to_string(),
            "Indie Culture".to_string(),
        ],
        local_recommendations: Vec::new(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;
    use chrono::Utc;

    struct FailingTasteGraph;

    #[async_trait]
    impl TasteGraph for FailingTasteGraph {
        async fn taste_profile(&self, _: &PreferenceSet) -> ServiceResult<TasteProfile> {
            Err(ServiceError::Network("connection refused".into()))
        }

        async fn recommendations(
            &self,
            _: &CulturalProfile,
            _: &str,
            _: Option<&str>,
        ) -> ServiceResult<Vec<TasteRecommendation>> {
            Err(ServiceError::Api(500, "boom".into()))
        }

        async fn cultural_connections(&self, _: &PreferenceSet) -> ServiceResult<Vec<TasteConnection>> {
            Err(ServiceError::NotConfigured("Qloo"))
        }

        async fn destination_recommendations(
            &self,
            _: &CulturalProfile,
            _: &[String],
        ) -> ServiceResult<Vec<DestinationSuggestion>> {
            Err(ServiceError::Parse("bad json".into()))
        }
    }

    struct EmptyTasteGraph;

    #[async_trait]
    impl TasteGraph for EmptyTasteGraph {
        async fn taste_profile(&self, _: &PreferenceSet) -> ServiceResult<TasteProfile> {
            Ok(TasteProfile::default())
        }

        async fn recommendations(
            &self,
            _: &CulturalProfile,
            _: &str,
            _: Option<&str>,
        ) -> ServiceResult<Vec<TasteRecommendation>> {
            Ok(Vec::new())
        }

        async fn cultural_connections(&self, _: &PreferenceSet) -> ServiceResult<Vec<TasteConnection>> {
            Ok(Vec::new())
        }

        async fn destination_recommendations(
            &self,
            _: &CulturalProfile,
            _: &[String],
        ) -> ServiceResult<Vec<DestinationSuggestion>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_failures_are_replaced_with_canned_data() {
        let graph = FallbackTasteGraph::new(FailingTasteGraph);
        let profile = CulturalProfile::new_for("user-1", Utc::now());
        let prefs = PreferenceSet::new();

        let taste = graph.taste_profile(&prefs).await.unwrap();
        assert_eq!(taste.cultural_dimensions["creativity"], 0.9);

        let recs = graph.recommendations(&profile, "restaurants", Some("Oslo")).await.unwrap();
        assert_eq!(recs[0].name, "Local Artisan Eatery");

        let connections = graph.cultural_connections(&prefs).await.unwrap();
        assert_eq!(connections[0].from, "Indie Folk");
        assert_eq!(connections[0].strength, 0.85);

        let destinations = graph.destination_recommendations(&profile, &[]).await.unwrap();
        assert_eq!(destinations[0].name, "Copenhagen");
    }

    #[tokio::test]
    async fn test_successful_answers_pass_through() {
        let graph = FallbackTasteGraph::new(EmptyTasteGraph);
        let profile = CulturalProfile::new_for("user-1", Utc::now());

        assert!(graph.recommendations(&profile, "restaurants", None).await.unwrap().is_empty());
        assert!(graph.cultural_connections(&PreferenceSet::new()).await.unwrap().is_empty());
    }

    #[test]
    fn test_unknown_category_has_no_fallback() {
        assert!(fallback_recommendations("fashion").is_empty());
        assert_eq!(fallback_recommendations("music")[0].category, "music");
    }
}
