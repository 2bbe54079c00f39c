use crate::types::{Result, SummaryRecord};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Store of processed articles. A row per link is the sole durable artifact
/// of the whole process; its presence means "already summarized".
#[derive(Clone)]
pub struct RecordStore {
    db: SqlitePool,
}

impl RecordStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        // The store is only touched from the single orchestrator task, and
        // an in-memory SQLite database exists per connection.
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                link TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                summary TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await?;

        info!("Record store ready at {}", database_url);
        Ok(Self { db })
    }

    pub async fn exists(&self, link: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM articles WHERE link = ?")
            .bind(link)
            .fetch_one(&self.db)
            .await?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    /// Inserts a new record. The PRIMARY KEY on link rejects duplicates;
    /// callers check `exists` first, so a violation is a programming error
    /// surfaced as a database error rather than a normal path.
    pub async fn insert(&self, link: &str, title: &str, summary: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO articles (link, title, summary, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(link)
        .bind(title)
        .bind(summary)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn get(&self, link: &str) -> Result<Option<SummaryRecord>> {
        let row = sqlx::query(
            "SELECT link, title, summary, created_at FROM articles WHERE link = ?",
        )
        .bind(link)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(r) => Ok(Some(SummaryRecord {
                link: r.get("link"),
                title: r.get("title"),
                summary: r.get("summary"),
                created_at: r.get::<DateTime<Utc>, _>("created_at"),
            })),
            None => Ok(None),
        }
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM articles")
            .fetch_one(&self.db)
            .await?;
        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SummarizerError;

    async fn memory_store() -> RecordStore {
        RecordStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn insert_then_exists() {
        let store = memory_store().await;
        assert!(!store.exists("https://example.com/a").await.unwrap());

        store
            .insert("https://example.com/a", "Article A", "A short summary.")
            .await
            .unwrap();

        assert!(store.exists("https://example.com/a").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);

        let record = store.get("https://example.com/a").await.unwrap().unwrap();
        assert_eq!(record.title, "Article A");
        assert_eq!(record.summary, "A short summary.");
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = memory_store().await;
        store
            .insert("https://example.com/a", "Article A", "First summary.")
            .await
            .unwrap();

        let second = store
            .insert("https://example.com/a", "Article A", "Second summary.")
            .await;
        assert!(matches!(second, Err(SummarizerError::Database(_))));

        // The original record is untouched.
        let record = store.get("https://example.com/a").await.unwrap().unwrap();
        assert_eq!(record.summary, "First summary.");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_link_reads_as_absent() {
        let store = memory_store().await;
        assert!(store.get("https://example.com/nope").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
