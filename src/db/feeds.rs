use sqlx::SqlitePool;
use uuid::Uuid;

use super::PersistenceError;

/// Durable set of subscribed feed urls, upserted by feed id.
#[derive(Clone)]
pub struct FeedRepository {
    pool: SqlitePool,
}

impl FeedRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, rows: &[(Uuid, String)]) -> Result<(), PersistenceError> {
        for (id, url) in rows {
            sqlx::query(r#"INSERT OR REPLACE INTO feeds (id, url) VALUES (?1, ?2)"#)
                .bind(id.to_string())
                .bind(url)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    pub async fn load(&self) -> Result<Vec<(Uuid, String)>, PersistenceError> {
        let rows: Vec<(String, String)> = sqlx::query_as(r#"SELECT id, url FROM feeds"#)
            .fetch_all(&self.pool)
            .await?;

        let mut feeds = Vec::with_capacity(rows.len());
        for (raw_id, url) in rows {
            match Uuid::parse_str(&raw_id) {
                Ok(id) => feeds.push((id, url)),
                Err(err) => {
                    tracing::warn!(
                        target: "db",
                        id = %raw_id,
                        url = %url,
                        error = %err,
                        "skipping feed row with malformed id"
                    );
                }
            }
        }
        Ok(feeds)
    }

    pub async fn purge(&self, url: &str) -> Result<bool, PersistenceError> {
        let affected = sqlx::query(r#"DELETE FROM feeds WHERE url = ?1"#)
            .bind(url)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::db::init_pool;

    use super::*;

    #[tokio::test]
    async fn upsert_by_id_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let pool = init_pool(&dir.path().join("feeds.db")).await.unwrap();
        let repo = FeedRepository::new(pool);

        let id = Uuid::new_v4();
        let rows = vec![(id, "https://example.org/feed.xml".to_string())];
        repo.save(&rows).await.unwrap();
        repo.save(&rows).await.unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded, rows);
    }

    #[tokio::test]
    async fn purge_removes_by_url() {
        let dir = TempDir::new().unwrap();
        let pool = init_pool(&dir.path().join("feeds.db")).await.unwrap();
        let repo = FeedRepository::new(pool);

        repo.save(&[(Uuid::new_v4(), "https://example.org/a".to_string())])
            .await
            .unwrap();
        assert!(repo.purge("https://example.org/a").await.unwrap());
        assert!(!repo.purge("https://example.org/a").await.unwrap());
        assert!(repo.load().await.unwrap().is_empty());
    }
}
