use std::{path::Path, str::FromStr, time::Duration};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

pub mod feeds;
pub mod history;

/// Storage faults surface to the caller; in-memory state stays the source
/// of truth for the running process and is never rolled back.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage failure: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt stored record: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub async fn init_pool(db_path: &Path) -> Result<SqlitePool, PersistenceError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS judged (
            id TEXT PRIMARY KEY,
            title TEXT,
            authors TEXT,
            content TEXT,
            links TEXT,
            summary TEXT,
            categories TEXT,
            language TEXT,
            is_liked INTEGER
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feeds (
            id TEXT PRIMARY KEY,
            url TEXT
        )
        "#,
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}
