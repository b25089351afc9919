//! Analytics events and metrics
//!
//! Events are recorded append-only by the service; metrics are derived on
//! demand from a bounded slice of them by [`compute_metrics`].

mod rollup;

pub use rollup::{
    compute_metrics, compute_realtime, AnalyticsMetrics, DestinationViews, EngagementMetrics,
    PreferenceCount, RealtimeSnapshot, RECENT_EVENTS_LIMIT, TOP_N,
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Default metrics window when the caller gives no start date
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Kind of recorded event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    Interaction,
    Conversion,
    Engagement,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PageView => "page_view",
            EventType::Interaction => "interaction",
            EventType::Conversion => "conversion",
            EventType::Engagement => "engagement",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "page_view" => Ok(EventType::PageView),
            "interaction" => Ok(EventType::Interaction),
            "conversion" => Ok(EventType::Conversion),
            "engagement" => Ok(EventType::Engagement),
            other => Err(Error::InvalidInput(format!("Unknown event type: {}", other))),
        }
    }
}

/// One recorded analytics event
///
/// Immutable once stored. `data` is an open key-value map; the rollup reads
/// `data.preferences` on onboarding conversions and `data.destinationName` on
/// destination page views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub action: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(
        event_type: EventType,
        action: impl Into<String>,
        session_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type,
            action: action.into(),
            data: Map::new(),
            session_id: session_id.into(),
            user_id: None,
            timestamp,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// Inclusive time range `[start, end]` for a metrics query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalyticsWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidInput(format!(
                "Window start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Fill in missing bounds: `end` defaults to `now`, `start` to
    /// [`DEFAULT_WINDOW_DAYS`] before `now`.
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let end = end.unwrap_or(now);
        let start = start.unwrap_or_else(|| now - Duration::days(DEFAULT_WINDOW_DAYS));
        Self::new(start, end)
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_event_type_round_trips_through_str() {
        for kind in [EventType::PageView, EventType::Interaction, EventType::Conversion, EventType::Engagement] {
            assert_eq!(kind.as_str().parse::<EventType>().unwrap(), kind);
        }
        assert!("click".parse::<EventType>().is_err());
    }

    #[test]
    fn test_event_wire_format_uses_camel_case() {
        let event = AnalyticsEvent::new(EventType::PageView, "view_destination", "s1", at(9))
            .with_user("u1")
            .with_data("destinationName", json!("Lisbon"));

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "page_view");
        assert_eq!(value["sessionId"], "s1");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["data"]["destinationName"], "Lisbon");
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = AnalyticsWindow::new(at(8), at(10)).unwrap();
        assert!(window.contains(at(8)));
        assert!(window.contains(at(10)));
        assert!(!window.contains(at(11)));
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        assert!(AnalyticsWindow::new(at(10), at(8)).is_err());
    }

    #[test]
    fn test_window_defaults_to_last_thirty_days() {
        let now = at(12);
        let window = AnalyticsWindow::resolve(None, None, now).unwrap();
        assert_eq!(window.end, now);
        assert_eq!(window.start, now - Duration::days(30));
    }
}
