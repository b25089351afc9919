//! OpenAI chat completions client

use async_trait::async_trait;
use concierge_common::config::OpenAiSettings;
use concierge_common::{CulturalContext, CulturalProfile, PreferenceSet, ProfileInsights, Recommendation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_status, http_client, ChatMessage, ConciergeModel, ServiceError, ServiceResult};

const SERVICE_NAME: &str = "OpenAI";

const CHAT_SYSTEM_PROMPT: &str = "You are a sophisticated Cultural Concierge AI with deep knowledge of \
global culture, arts, cuisine, fashion, and travel. Understand the user's cultural preferences through \
natural conversation, make intelligent connections between cultural domains (music to cuisine, film to \
travel), and suggest authentic, non-touristy experiences. Reference specific artists, venues or cultural \
movements when relevant. Keep responses conversational but insightful, at most 2-3 sentences.";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`ConciergeModel`] backed by the OpenAI chat completions API
pub struct OpenAiClient {
    http_client: reqwest::Client,
    settings: OpenAiSettings,
}

impl OpenAiClient {
    pub fn new(settings: OpenAiSettings) -> ServiceResult<Self> {
        Ok(Self {
            http_client: http_client()?,
            settings,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> ServiceResult<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ServiceError::NotConfigured(SERVICE_NAME))?;

        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let request = CompletionRequest {
            model: &self.settings.model,
            messages,
            max_tokens,
            temperature,
        };

        tracing::debug!(model = %self.settings.model, max_tokens, "Requesting chat completion");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let completion: CompletionResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::Parse("completion has no content".to_string()))
    }
}

#[async_trait]
impl ConciergeModel for OpenAiClient {
    async fn chat_reply(&self, message: &str, context: &CulturalContext) -> ServiceResult<String> {
        let context_json =
            serde_json::to_string(context).map_err(|e| ServiceError::Parse(e.to_string()))?;
        let system = format!("{}\n\nCurrent user context: {}", CHAT_SYSTEM_PROMPT, context_json);

        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: system,
            },
            ChatMessage::user(message),
        ];
        self.complete(messages, 200, 0.7).await
    }

    async fn extract_preferences(&self, history: &[ChatMessage]) -> ServiceResult<PreferenceSet> {
        let history_json =
            serde_json::to_string(history).map_err(|e| ServiceError::Parse(e.to_string()))?;
        let prompt = format!(
            "Extract cultural preferences from this conversation:\n\n\
             Conversation: {}\n\n\
             Identify specific preferences for music (artists, genres, styles), film (directors, \
             genres, movements), cuisine (types, styles, restaurants, chefs), fashion (brands, \
             styles, aesthetics) and travel (types of experiences, destinations).\n\n\
             Answer with JSON only, shaped as \
             {{\"music\": [], \"film\": [], \"cuisine\": [], \"fashion\": [], \"travel\": []}}",
            history_json
        );

        let answer = self.complete(vec![ChatMessage::user(prompt)], 300, 0.5).await?;
        parse_preference_set(&answer)
    }

    async fn analyze_profile(&self, preferences: &PreferenceSet) -> ServiceResult<ProfileInsights> {
        let preferences_json =
            serde_json::to_string(preferences).map_err(|e| ServiceError::Parse(e.to_string()))?;
        let prompt = format!(
            "Analyze this cultural profile and provide insights:\n\n\
             Preferences: {}\n\n\
             Provide 3-4 personality traits, 3-4 cultural affinities or movements they would \
             connect with, 2-3 unexpected cultural connections across domains, a taste map of \
             weighted links between their preferences, and a breakdown of their taste by \
             domain for a chart.\n\n\
             Answer with JSON only, shaped as \
             {{\"personalityTraits\": [], \"culturalAffinities\": [], \
             \"crossDomainConnections\": [{{\"from\": \"\", \"to\": \"\", \"reasoning\": \"\"}}], \
             \"connections\": [{{\"from\": \"\", \"to\": \"\", \"strength\": 0.8, \"domain\": \"\"}}], \
             \"tasteData\": [{{\"name\": \"\", \"value\": 30, \"color\": \"#8B5CF6\"}}]}}",
            preferences_json
        );

        let answer = self.complete(vec![ChatMessage::user(prompt)], 800, 0.6).await?;
        parse_json(&answer)
    }

    async fn travel_recommendations(
        &self,
        profile: &CulturalProfile,
        destination: &str,
    ) -> ServiceResult<Vec<Recommendation>> {
        let profile_json = serde_json::to_string(&CulturalContext::from(profile))
            .map_err(|e| ServiceError::Parse(e.to_string()))?;
        let prompt = format!(
            "Based on this cultural profile, generate specific travel recommendations for {}:\n\n\
             Cultural Profile: {}\n\n\
             Provide 3-5 recommendations: restaurants that match their taste, cultural activities \
             or venues, shopping or local experiences, and hidden gems only locals know.\n\n\
             Answer with a JSON array only, each item shaped as \
             {{\"type\": \"restaurant|activity|shopping|accommodation\", \"title\": \"\", \
             \"description\": \"\", \"location\": \"\", \"culturalMatch\": 0.85, \"tags\": [], \
             \"reasoning\": \"\"}}",
            destination, profile_json
        );

        let answer = self.complete(vec![ChatMessage::user(prompt)], 800, 0.7).await?;
        parse_json(&answer)
    }
}

/// Remove a surrounding ```json fence if the model added one
pub fn strip_json_fence(answer: &str) -> &str {
    let trimmed = answer.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let body = rest
        .split_once('\n')
        .map(|(_, body)| body)
        .unwrap_or_else(|| rest.trim_start_matches("json"));
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_json<T: serde::de::DeserializeOwned>(answer: &str) -> ServiceResult<T> {
    serde_json::from_str(strip_json_fence(answer)).map_err(|e| ServiceError::Parse(e.to_string()))
}

/// Category lists from a model answer; non-string items and non-list
/// categories are skipped.
fn parse_preference_set(answer: &str) -> ServiceResult<PreferenceSet> {
    let value: Value = parse_json(answer)?;
    let Value::Object(categories) = value else {
        return Err(ServiceError::Parse("expected a JSON object of categories".to_string()));
    };

    Ok(categories
        .into_iter()
        .filter_map(|(category, labels)| match labels {
            Value::Array(items) => Some((
                category,
                items
                    .into_iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect::<Vec<String>>(),
            )),
            _ => None,
        })
        .collect())
}
