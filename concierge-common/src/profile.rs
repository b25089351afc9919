//! Cultural profile model
//!
//! A profile is the stored [`PreferenceSet`] plus the traits, affinities and
//! taste connections the AI collaborators derive from it. Only the
//! preferences go through the merge engine; everything else is overwritten
//! when the analysis supplies it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::preferences::{dedupe, merge, PreferenceSet};

/// Cross-domain affinity edge, e.g. music -> cuisine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasteConnection {
    pub from: String,
    pub to: String,
    /// Always within `[0, 1]`
    pub strength: f64,
    pub domain: String,
}

impl TasteConnection {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        strength: f64,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            strength: clamp_unit(strength),
            domain: domain.into(),
        }
    }

    /// Pull `strength` back into `[0, 1]`; NaN becomes 0
    pub fn clamped(mut self) -> Self {
        self.strength = clamp_unit(self.strength);
        self
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Slice of the taste breakdown chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasteDatum {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub color: String,
}

/// Stored cultural profile of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalProfile {
    pub id: Uuid,
    pub user_id: String,
    pub preferences: PreferenceSet,
    pub taste_map: Vec<TasteConnection>,
    pub taste_data: Vec<TasteDatum>,
    pub personality_traits: Vec<String>,
    pub cultural_affinities: Vec<String>,
    pub completed_onboarding: bool,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CulturalProfile {
    /// Default profile for a user who has not onboarded yet
    pub fn new_for(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            preferences: PreferenceSet::with_default_categories(),
            taste_map: Vec::new(),
            taste_data: Vec::new(),
            personality_traits: Vec::new(),
            cultural_affinities: Vec::new(),
            completed_onboarding: false,
            last_updated: now,
            created_at: now,
        }
    }

    /// Fold an analysis result into the profile
    ///
    /// `incoming` is merged into the stored preferences; each insight field
    /// replaces the stored one only when present. Marks onboarding complete.
    pub fn apply_insights(
        &mut self,
        incoming: &PreferenceSet,
        insights: &ProfileInsights,
        now: DateTime<Utc>,
    ) {
        self.preferences = merge(&self.preferences, incoming);

        if let Some(traits) = &insights.personality_traits {
            self.personality_traits = traits.clone();
        }
        if let Some(affinities) = &insights.cultural_affinities {
            self.cultural_affinities = affinities.clone();
        }
        if let Some(connections) = &insights.connections {
            self.taste_map = connections.iter().cloned().map(TasteConnection::clamped).collect();
        }
        if let Some(taste_data) = &insights.taste_data {
            self.taste_data = taste_data.clone();
        }

        self.completed_onboarding = true;
        self.last_updated = now;
    }

    /// Apply a manual edit
    ///
    /// Unlike [`apply_insights`](Self::apply_insights) this is an overwrite:
    /// each supplied category replaces the stored list for that category, so
    /// users can remove labels.
    pub fn apply_update(&mut self, update: ProfileUpdate, now: DateTime<Utc>) {
        if let Some(preferences) = update.preferences {
            for (category, labels) in preferences.into_inner() {
                self.preferences.insert(category, dedupe(labels));
            }
        }
        if let Some(traits) = update.personality_traits {
            self.personality_traits = traits;
        }
        if let Some(affinities) = update.cultural_affinities {
            self.cultural_affinities = affinities;
        }
        if let Some(completed) = update.completed_onboarding {
            self.completed_onboarding = completed;
        }
        self.last_updated = now;
    }

    /// Tags used to match stored destinations against this profile
    pub fn matching_tags(&self) -> Vec<String> {
        self.cultural_affinities
            .iter()
            .chain(&self.personality_traits)
            .cloned()
            .collect()
    }
}

/// What the profile analysis returns; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileInsights {
    pub personality_traits: Option<Vec<String>>,
    pub cultural_affinities: Option<Vec<String>>,
    pub cross_domain_connections: Option<Vec<CrossDomainConnection>>,
    pub connections: Option<Vec<TasteConnection>>,
    pub taste_data: Option<Vec<TasteDatum>>,
}

/// Free-form explanation of an unexpected link between two preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossDomainConnection {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub reasoning: String,
}

/// Manual profile edit, all fields optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub preferences: Option<PreferenceSet>,
    pub personality_traits: Option<Vec<String>>,
    pub cultural_affinities: Option<Vec<String>>,
    pub completed_onboarding: Option<bool>,
}

/// Context handed to the chat model with every message
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalContext {
    pub preferences: PreferenceSet,
    pub personality_traits: Vec<String>,
    pub cultural_affinities: Vec<String>,
}

impl From<&CulturalProfile> for CulturalContext {
    fn from(profile: &CulturalProfile) -> Self {
        Self {
            preferences: profile.preferences.clone(),
            personality_traits: profile.personality_traits.clone(),
            cultural_affinities: profile.cultural_affinities.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    fn prefs(entries: &[(&str, &[&str])]) -> PreferenceSet {
        entries
            .iter()
            .map(|(category, labels)| (category.to_string(), labels.to_vec()))
            .collect()
    }

    #[test]
    fn test_strength_is_clamped() {
        assert_eq!(TasteConnection::new("a", "b", 1.7, "Music → Travel").strength, 1.0);
        assert_eq!(TasteConnection::new("a", "b", -0.2, "Music → Travel").strength, 0.0);
        assert_eq!(TasteConnection::new("a", "b", f64::NAN, "Music → Travel").strength, 0.0);
        assert_eq!(TasteConnection::new("a", "b", 0.92, "Music → Travel").strength, 0.92);
    }

    #[test]
    fn test_new_profile_has_empty_default_categories() {
        let profile = CulturalProfile::new_for("user-1", now());
        assert!(!profile.completed_onboarding);
        assert_eq!(profile.preferences.len(), 5);
        assert_eq!(profile.preferences.label_count(), 0);
    }

    #[test]
    fn test_apply_insights_merges_preferences_and_overwrites_present_fields() {
        let mut profile = CulturalProfile::new_for("user-1", now());
        profile.preferences = prefs(&[("music", &["Bon Iver"])]);
        profile.personality_traits = vec!["Curious".into()];
        profile.cultural_affinities = vec!["Slow Food".into()];

        let insights = ProfileInsights {
            personality_traits: Some(vec!["Authentic".into(), "Creative".into()]),
            connections: Some(vec![TasteConnection {
                from: "Bon Iver".into(),
                to: "Copenhagen".into(),
                strength: 1.4,
                domain: "Music → Travel".into(),
            }]),
            ..Default::default()
        };
        let later = now() + Duration::minutes(5);

        profile.apply_insights(&prefs(&[("music", &["bon iver", "Fleet Foxes"])]), &insights, later);

        assert_eq!(profile.preferences.labels("music"), ["Bon Iver", "Fleet Foxes"]);
        assert_eq!(profile.personality_traits, ["Authentic", "Creative"]);
        assert_eq!(profile.cultural_affinities, ["Slow Food"]);
        assert_eq!(profile.taste_map.len(), 1);
        assert_eq!(profile.taste_map[0].strength, 1.0);
        assert!(profile.completed_onboarding);
        assert_eq!(profile.last_updated, later);
    }

    #[test]
    fn test_apply_update_replaces_supplied_categories_only() {
        let mut profile = CulturalProfile::new_for("user-1", now());
        profile.preferences = prefs(&[("music", &["Bon Iver", "Fleet Foxes"]), ("film", &["Wes Anderson"])]);

        let update = ProfileUpdate {
            preferences: Some(prefs(&[("music", &["Fleet Foxes"])])),
            completed_onboarding: Some(true),
            ..Default::default()
        };
        profile.apply_update(update, now());

        assert_eq!(profile.preferences.labels("music"), ["Fleet Foxes"]);
        assert_eq!(profile.preferences.labels("film"), ["Wes Anderson"]);
        assert!(profile.completed_onboarding);
    }

    #[test]
    fn test_apply_update_keeps_labels_unique_per_category() {
        let mut profile = CulturalProfile::new_for("user-1", now());
        let update = ProfileUpdate {
            preferences: Some(prefs(&[("music", &["Bon Iver", "bon iver", "Bon Iver (band)", "Sade"])])),
            ..Default::default()
        };
        profile.apply_update(update, now());

        assert_eq!(profile.preferences.labels("music"), ["Bon Iver", "Sade"]);
    }

    #[test]
    fn test_insights_parse_with_missing_fields() {
        let insights: ProfileInsights = serde_json::from_str(
            r#"{"personalityTraits": ["Bold"], "tasteData": [{"name": "Music", "value": 40}]}"#,
        )
        .unwrap();
        assert_eq!(insights.personality_traits, Some(vec!["Bold".to_string()]));
        assert!(insights.connections.is_none());
        assert_eq!(insights.taste_data.unwrap()[0].color, "");
    }

    #[test]
    fn test_matching_tags_lists_affinities_then_traits() {
        let mut profile = CulturalProfile::new_for("user-1", now());
        profile.cultural_affinities = vec!["Nordic Design".into()];
        profile.personality_traits = vec!["Creative".into()];
        assert_eq!(profile.matching_tags(), ["Nordic Design", "Creative"]);
    }
}
