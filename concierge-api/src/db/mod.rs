//! Database access for concierge-api
//!
//! SQLite via sqlx. Timestamps are stored as RFC 3339 text with millisecond
//! precision so text order matches time order; list-valued fields are stored
//! as JSON text.

pub mod destinations;
pub mod events;
pub mod profiles;
pub mod retry;

pub use retry::retry_on_lock;

use chrono::{DateTime, SecondsFormat, Utc};
use concierge_common::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// SQLite busy_timeout per connection
pub const BUSY_TIMEOUT_MS: u64 = 5000;
/// Upper bound for [`retry_on_lock`] on writes
pub const MAX_LOCK_WAIT_MS: u64 = 5000;
const MAX_CONNECTIONS: u32 = 5;

/// Initialize database connection pool
///
/// Creates the parent directory and the database file when missing, then
/// creates the tables.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the service tables if they don't exist
///
/// Idempotent; also used by tests against in-memory pools.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cultural_profiles (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            preferences TEXT NOT NULL DEFAULT '{}',
            taste_map TEXT NOT NULL DEFAULT '[]',
            taste_data TEXT NOT NULL DEFAULT '[]',
            personality_traits TEXT NOT NULL DEFAULT '[]',
            cultural_affinities TEXT NOT NULL DEFAULT '[]',
            completed_onboarding INTEGER NOT NULL DEFAULT 0,
            last_updated TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS destinations (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            country TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            image_url TEXT NOT NULL DEFAULT '',
            highlights TEXT NOT NULL DEFAULT '[]',
            recommendations TEXT NOT NULL DEFAULT '[]',
            coordinates TEXT,
            cultural_tags TEXT NOT NULL DEFAULT '[]',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            last_updated TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_destinations_created_at ON destinations(created_at)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analytics_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_type TEXT NOT NULL,
            action TEXT NOT NULL,
            data TEXT NOT NULL DEFAULT '{}',
            session_id TEXT NOT NULL,
            user_id TEXT,
            ip_address TEXT,
            user_agent TEXT,
            timestamp_ms INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_analytics_events_timestamp ON analytics_events(timestamp_ms)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_analytics_events_session ON analytics_events(session_id)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (cultural_profiles, destinations, analytics_events)");

    Ok(())
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", column, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn from_json<T: serde::de::DeserializeOwned>(column: &str, value: &str) -> Result<T> {
    serde_json::from_str(value)
        .map_err(|e| Error::Internal(format!("Failed to deserialize {}: {}", column, e)))
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // One connection: every :memory: connection is its own database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_tables(&pool).await.unwrap();
    pool
}
