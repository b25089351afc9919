//! Append-only analytics event log

use chrono::{DateTime, TimeZone, Utc};
use concierge_common::{AnalyticsEvent, Error, EventType, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{from_json, retry_on_lock, to_json, MAX_LOCK_WAIT_MS};

/// Where a tracked event came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Append an event
pub async fn insert_event(pool: &SqlitePool, event: &AnalyticsEvent) -> Result<()> {
    insert_event_with_origin(pool, event, &EventOrigin::default()).await
}

/// Append an event along with the client address and user agent
pub async fn insert_event_with_origin(
    pool: &SqlitePool,
    event: &AnalyticsEvent,
    origin: &EventOrigin,
) -> Result<()> {
    let data = to_json(&event.data)?;
    let timestamp_ms = event.timestamp.timestamp_millis();

    retry_on_lock("insert_event", MAX_LOCK_WAIT_MS, || async {
        sqlx::query(
            r#"
            INSERT INTO analytics_events (
                event_type, action, data, session_id, user_id,
                ip_address, user_agent, timestamp_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.event_type.as_str())
        .bind(&event.action)
        .bind(&data)
        .bind(&event.session_id)
        .bind(&event.user_id)
        .bind(&origin.ip_address)
        .bind(&origin.user_agent)
        .bind(timestamp_ms)
        .execute(pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    })
    .await
}

/// Every event at or after `since`, oldest first
///
/// Events with equal timestamps come back in insertion order.
pub async fn events_since(pool: &SqlitePool, since: DateTime<Utc>) -> Result<Vec<AnalyticsEvent>> {
    let rows = sqlx::query(
        r#"
        SELECT event_type, action, data, session_id, user_id, timestamp_ms
        FROM analytics_events
        WHERE timestamp_ms >= ?
        ORDER BY timestamp_ms, id
        "#,
    )
    .bind(since.timestamp_millis())
    .fetch_all(pool)
    .await?;

    rows.iter().map(event_from_row).collect()
}

fn event_from_row(row: &SqliteRow) -> Result<AnalyticsEvent> {
    let event_type: EventType = row.get::<&str, _>("event_type").parse()?;
    let timestamp_ms: i64 = row.get("timestamp_ms");
    let timestamp = Utc
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .ok_or_else(|| Error::Internal(format!("Invalid event timestamp: {}", timestamp_ms)))?;

    Ok(AnalyticsEvent {
        event_type,
        action: row.get("action"),
        data: from_json("data", row.get("data"))?,
        session_id: row.get("session_id"),
        user_id: row.get("user_id"),
        timestamp,
    })
}
