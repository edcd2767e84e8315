//! SQLite connection pool and schema

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tracing::info;

use super::errors::StoreResult;
use crate::config::StoreConfig;

/// Detection log and feedback documents
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS phishing_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    is_phishing INTEGER NOT NULL,
    confidence REAL NOT NULL,
    detection_time INTEGER NOT NULL,
    html_content TEXT,
    features TEXT
);

CREATE INDEX IF NOT EXISTS idx_phishing_urls_time ON phishing_urls(detection_time);
CREATE INDEX IF NOT EXISTS idx_phishing_urls_verdict ON phishing_urls(is_phishing, detection_time);

CREATE TABLE IF NOT EXISTS user_feedback (
    id TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    feedback_time INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_user_feedback_time ON user_feedback(feedback_time);
"#;

/// Open the pool and create tables that do not exist yet.
///
/// In-memory databases live only as long as their connection, so they get a
/// single connection that is never recycled.
///
/// # Errors
///
/// `StoreError::Unavailable` if the URL is malformed, the file cannot be
/// opened or the schema cannot be applied.
pub async fn connect(config: &StoreConfig) -> StoreResult<SqlitePool> {
    let in_memory = config.database_url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(30));
    if !in_memory {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let mut pool_options = SqlitePoolOptions::new();
    pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(config.max_connections)
    };

    let pool = pool_options.connect_with(options).await?;

    sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;

    info!(database_url = %config.database_url, "Result database ready");
    Ok(pool)
}
