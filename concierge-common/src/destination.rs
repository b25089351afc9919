//! Destinations and recommendations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Kind of place or experience being recommended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Restaurant,
    #[default]
    Activity,
    Event,
    Accommodation,
    Shopping,
    #[serde(other)]
    Other,
}

impl RecommendationKind {
    /// Map a taste-graph category ("restaurants", "music", ...) to a kind
    pub fn from_category(category: &str) -> Self {
        match category {
            "restaurants" | "restaurant" => RecommendationKind::Restaurant,
            "activities" | "activity" => RecommendationKind::Activity,
            "shopping" => RecommendationKind::Shopping,
            "accommodation" | "hotels" => RecommendationKind::Accommodation,
            "events" | "event" | "music" => RecommendationKind::Event,
            _ => RecommendationKind::Other,
        }
    }
}

/// A single recommended place or experience
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recommendation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Match score in `[0, 1]`
    pub cultural_match: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_country: Option<String>,
}

/// Best matches first, at most `limit`
///
/// Equal scores keep their input order.
pub fn rank_recommendations(mut recommendations: Vec<Recommendation>, limit: usize) -> Vec<Recommendation> {
    recommendations.sort_by(|a, b| b.cultural_match.total_cmp(&a.cultural_match));
    recommendations.truncate(limit);
    recommendations
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Stored destination with its curated recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub country: String,
    pub description: String,
    pub image_url: String,
    pub highlights: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub coordinates: Option<Coordinates>,
    pub cultural_tags: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Destination {
    pub fn create(user_id: impl Into<String>, new: NewDestination, now: DateTime<Utc>) -> Result<Self> {
        new.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: new.name.trim().to_string(),
            country: new.country,
            description: new.description,
            image_url: new.image_url,
            highlights: new.highlights,
            recommendations: new.recommendations,
            coordinates: new.coordinates,
            cultural_tags: new.cultural_tags,
            is_active: true,
            created_at: now,
            last_updated: now,
        })
    }

    /// Recommendations annotated with this destination's name and country
    pub fn annotated_recommendations(&self) -> impl Iterator<Item = Recommendation> + '_ {
        self.recommendations.iter().cloned().map(|mut rec| {
            rec.destination_name = Some(self.name.clone());
            rec.destination_country = Some(self.country.clone());
            rec
        })
    }
}

/// Body of a destination creation request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewDestination {
    pub name: String,
    pub country: String,
    pub description: String,
    pub image_url: String,
    pub highlights: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub coordinates: Option<Coordinates>,
    pub cultural_tags: Vec<String>,
}

impl NewDestination {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("Destination name is required".to_string()));
        }
        if let Some(bad) = self
            .recommendations
            .iter()
            .find(|rec| !(0.0..=1.0).contains(&rec.cultural_match))
        {
            return Err(Error::InvalidInput(format!(
                "culturalMatch of '{}' must be between 0 and 1",
                bad.title
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rec(title: &str, score: f64) -> Recommendation {
        Recommendation {
            title: title.to_string(),
            cultural_match: score,
            ..Default::default()
        }
    }

    #[test]
    fn test_rank_sorts_descending_and_truncates() {
        let ranked = rank_recommendations(vec![rec("a", 0.5), rec("b", 0.9), rec("c", 0.7)], 2);
        let titles: Vec<&str> = ranked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["b", "c"]);
    }

    #[test]
    fn test_rank_keeps_input_order_on_ties() {
        let ranked = rank_recommendations(vec![rec("first", 0.8), rec("second", 0.8)], 10);
        assert_eq!(ranked[0].title, "first");
        assert_eq!(ranked[1].title, "second");
    }

    #[test]
    fn test_unknown_kind_deserializes_as_other() {
        let parsed: Recommendation = serde_json::from_str(r#"{"type": "museum", "title": "MoMA"}"#).unwrap();
        assert_eq!(parsed.kind, RecommendationKind::Other);
        assert_eq!(parsed.title, "MoMA");
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(RecommendationKind::from_category("restaurants"), RecommendationKind::Restaurant);
        assert_eq!(RecommendationKind::from_category("music"), RecommendationKind::Event);
        assert_eq!(RecommendationKind::from_category("opera"), RecommendationKind::Other);
    }

    #[test]
    fn test_create_requires_name() {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        assert!(Destination::create("u1", NewDestination::default(), now).is_err());

        let created = Destination::create(
            "u1",
            NewDestination {
                name: "  Copenhagen ".into(),
                country: "Denmark".into(),
                cultural_tags: vec!["Nordic Design".into()],
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert_eq!(created.name, "Copenhagen");
        assert!(created.is_active);
        assert_eq!(created.cultural_tags, ["Nordic Design"]);
    }

    #[test]
    fn test_create_rejects_out_of_range_match() {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        let new = NewDestination {
            name: "Lisbon".into(),
            recommendations: vec![rec("Tram 28", 1.5)],
            ..Default::default()
        };
        assert!(Destination::create("u1", new, now).is_err());
    }
}
