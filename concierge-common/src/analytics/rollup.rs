//! Metrics rollup over raw analytics events
//!
//! Pure read-side computation: the same events, window and `now` always give
//! the same metrics, so callers can recompute freely.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::{AnalyticsEvent, AnalyticsWindow, EventType};

/// Length of the preference and destination leaderboards
pub const TOP_N: usize = 10;

/// Maximum events returned in a realtime snapshot
pub const RECENT_EVENTS_LIMIT: usize = 50;

const ACTIVE_USER_HOURS: i64 = 24;
const REAL_TIME_MINUTES: i64 = 5;
const RECENT_ACTIVITY_HOURS: i64 = 1;

const ONBOARDING_STARTED: &str = "start_onboarding";
const ONBOARDING_COMPLETED: &str = "onboarding_completed";
const VIEW_DESTINATION: &str = "view_destination";
const VIEW_DASHBOARD: &str = "view_dashboard";

/// Dashboard payload for a metrics query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsMetrics {
    pub total_visitors: u64,
    pub active_users: u64,
    /// Minutes, rounded to the nearest integer
    pub avg_session_duration: i64,
    pub onboarding_completion_rate: f64,
    pub top_cultural_preferences: Vec<PreferenceCount>,
    pub popular_destinations: Vec<DestinationViews>,
    pub engagement_metrics: EngagementMetrics,
    pub real_time_users: u64,
    pub date_range: AnalyticsWindow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceCount {
    pub preference: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationViews {
    pub destination: String,
    pub views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    pub chat_messages: u64,
    pub profile_views: u64,
    pub recommendation_clicks: u64,
}

/// Live view of the last hour of activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeSnapshot {
    pub active_sessions: u64,
    /// Newest first
    pub recent_events: Vec<AnalyticsEvent>,
    pub page_views_last_hour: u64,
    pub timestamp: DateTime<Utc>,
}

/// Compute the metrics dashboard for `window`
///
/// `now` anchors the two recency measures (active users over the last 24h,
/// real-time users over the last 5 minutes), which ignore `window`.
/// Empty input yields zeros and empty lists.
pub fn compute_metrics(
    events: &[AnalyticsEvent],
    window: &AnalyticsWindow,
    now: DateTime<Utc>,
) -> AnalyticsMetrics {
    let in_window: Vec<&AnalyticsEvent> = events
        .iter()
        .filter(|event| window.contains(event.timestamp))
        .collect();

    let active_since = now - Duration::hours(ACTIVE_USER_HOURS);
    let active_users: HashSet<&str> = events
        .iter()
        .filter(|event| event.timestamp >= active_since)
        .filter_map(|event| event.user_id.as_deref())
        .collect();

    AnalyticsMetrics {
        total_visitors: distinct_sessions(in_window.iter().copied()),
        active_users: active_users.len() as u64,
        avg_session_duration: average_session_minutes(&in_window),
        onboarding_completion_rate: onboarding_completion_rate(&in_window),
        top_cultural_preferences: top_preferences(&in_window),
        popular_destinations: popular_destinations(&in_window),
        engagement_metrics: engagement(&in_window),
        real_time_users: real_time_users(events, now),
        date_range: *window,
    }
}

/// Snapshot of the last hour: sessions active in the last 5 minutes, the
/// newest [`RECENT_EVENTS_LIMIT`] events and the page view count.
pub fn compute_realtime(events: &[AnalyticsEvent], now: DateTime<Utc>) -> RealtimeSnapshot {
    let hour_ago = now - Duration::hours(RECENT_ACTIVITY_HOURS);

    let mut recent: Vec<&AnalyticsEvent> = events
        .iter()
        .filter(|event| event.timestamp >= hour_ago)
        .collect();
    let page_views_last_hour = recent
        .iter()
        .filter(|event| event.event_type == EventType::PageView)
        .count() as u64;

    // Stable sort keeps input order among equal timestamps
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let recent_events = recent
        .into_iter()
        .take(RECENT_EVENTS_LIMIT)
        .cloned()
        .collect();

    RealtimeSnapshot {
        active_sessions: real_time_users(events, now),
        recent_events,
        page_views_last_hour,
        timestamp: now,
    }
}

fn distinct_sessions<'a>(events: impl Iterator<Item = &'a AnalyticsEvent>) -> u64 {
    events
        .map(|event| event.session_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u64
}

fn real_time_users(events: &[AnalyticsEvent], now: DateTime<Utc>) -> u64 {
    let since = now - Duration::minutes(REAL_TIME_MINUTES);
    distinct_sessions(events.iter().filter(|event| event.timestamp >= since))
}

fn average_session_minutes(events: &[&AnalyticsEvent]) -> i64 {
    let mut spans: HashMap<&str, (DateTime<Utc>, DateTime<Utc>)> = HashMap::new();
    for event in events {
        spans
            .entry(event.session_id.as_str())
            .and_modify(|(first, last)| {
                *first = (*first).min(event.timestamp);
                *last = (*last).max(event.timestamp);
            })
            .or_insert((event.timestamp, event.timestamp));
    }

    if spans.is_empty() {
        return 0;
    }

    let total_ms: i64 = spans
        .values()
        .map(|(first, last)| (*last - *first).num_milliseconds())
        .sum();
    let mean_ms = total_ms as f64 / spans.len() as f64;

    (mean_ms / 60_000.0).round() as i64
}

fn onboarding_completion_rate(events: &[&AnalyticsEvent]) -> f64 {
    let started = events
        .iter()
        .filter(|event| event.action == ONBOARDING_STARTED)
        .count();
    let completed = events
        .iter()
        .filter(|event| event.action == ONBOARDING_COMPLETED)
        .count();

    if started == 0 {
        0.0
    } else {
        completed as f64 / started as f64
    }
}

fn top_preferences(events: &[&AnalyticsEvent]) -> Vec<PreferenceCount> {
    let mut counter = OrderedCounter::default();

    for event in events {
        if event.event_type != EventType::Conversion || event.action != ONBOARDING_COMPLETED {
            continue;
        }
        match event.data.get("preferences") {
            Some(Value::Array(items)) => {
                for preference in items.iter().filter_map(Value::as_str) {
                    counter.add(preference);
                }
            }
            Some(Value::String(preference)) => counter.add(preference),
            _ => {}
        }
    }

    counter
        .top(TOP_N)
        .into_iter()
        .map(|(preference, count)| PreferenceCount {
            preference: preference.to_string(),
            count,
        })
        .collect()
}

fn popular_destinations(events: &[&AnalyticsEvent]) -> Vec<DestinationViews> {
    let mut counter = OrderedCounter::default();

    for event in events {
        if event.event_type != EventType::PageView || event.action != VIEW_DESTINATION {
            continue;
        }
        if let Some(name) = event.data.get("destinationName").and_then(Value::as_str) {
            counter.add(name);
        }
    }

    counter
        .top(TOP_N)
        .into_iter()
        .map(|(destination, views)| DestinationViews {
            destination: destination.to_string(),
            views,
        })
        .collect()
}

fn engagement(events: &[&AnalyticsEvent]) -> EngagementMetrics {
    let mut metrics = EngagementMetrics::default();

    for event in events {
        let action = event.action.as_str();
        match event.event_type {
            EventType::Interaction => {
                if action.contains("chat") || action.contains("message") {
                    metrics.chat_messages += 1;
                }
                if action.contains("recommendation") || action.contains("select_destination") {
                    metrics.recommendation_clicks += 1;
                }
            }
            EventType::PageView if action == VIEW_DASHBOARD => metrics.profile_views += 1,
            _ => {}
        }
    }

    metrics
}

/// Occurrence counter that remembers first-seen order for tie breaking
#[derive(Default)]
struct OrderedCounter<'a> {
    index: HashMap<&'a str, usize>,
    entries: Vec<(&'a str, u64)>,
}

impl<'a> OrderedCounter<'a> {
    fn add(&mut self, key: &'a str) {
        match self.index.get(key) {
            Some(&position) => self.entries[position].1 += 1,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    fn top(mut self, limit: usize) -> Vec<(&'a str, u64)> {
        // Stable: equal counts stay in first-seen order
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries.truncate(limit);
        self.entries
    }
}
