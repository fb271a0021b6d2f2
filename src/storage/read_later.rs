use anyhow::{Context, Result};

use super::schema::Database;
use super::types::{ReadLaterRow, SavedArticle};
use crate::api::Article;
use crate::feed::ReadLaterStore;

impl Database {
    // ========================================================================
    // Read Later Operations
    // ========================================================================

    /// Save an article. Saving it again refreshes the stored copy and
    /// moves it to the top of the list.
    pub async fn save_read_later(&self, article: &Article) -> Result<()> {
        let tags = serde_json::to_string(&article.tags).context("Failed to encode tags")?;
        sqlx::query(
            r#"
            INSERT INTO read_later (id, title, url, author, tags, likes_count, created_at, saved_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                url = excluded.url,
                author = excluded.author,
                tags = excluded.tags,
                likes_count = excluded.likes_count,
                created_at = excluded.created_at,
                saved_at = excluded.saved_at
        "#,
        )
        .bind(&article.id)
        .bind(&article.title)
        .bind(&article.url)
        .bind(&article.author)
        .bind(&tags)
        .bind(article.likes_count)
        .bind(article.created_at)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All saved articles, most recently saved first.
    pub async fn list_read_later(&self) -> Result<Vec<SavedArticle>> {
        let rows: Vec<ReadLaterRow> = sqlx::query_as(
            r#"
            SELECT id, title, url, author, tags, likes_count, created_at, saved_at
            FROM read_later
            ORDER BY saved_at DESC, rowid DESC
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ReadLaterRow::into_saved).collect())
    }

    /// Remove a saved article. Returns whether a row was deleted.
    pub async fn remove_read_later(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM read_later WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl ReadLaterStore for Database {
    async fn add_read_later(&self, article: &Article) -> Result<()> {
        self.save_read_later(article).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    fn article(id: &str) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Title {id}"),
            url: format!("https://qiita.com/alice/items/{id}"),
            author: "alice".to_string(),
            tags: vec!["Rust".to_string(), "tokio".to_string()],
            likes_count: 12,
            created_at: Some(1_700_000_000),
        }
    }

    #[tokio::test]
    async fn test_list_empty() {
        let db = test_db().await;
        assert!(db.list_read_later().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_and_list_preserves_fields() {
        let db = test_db().await;
        db.add_read_later(&article("a1")).await.unwrap();

        let saved = db.list_read_later().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].article, article("a1"));
        assert!(saved[0].saved_at > 0);
    }

    #[tokio::test]
    async fn test_most_recent_first() {
        let db = test_db().await;
        db.add_read_later(&article("a1")).await.unwrap();
        db.add_read_later(&article("a2")).await.unwrap();
        db.add_read_later(&article("a3")).await.unwrap();

        let ids: Vec<String> = db
            .list_read_later()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.article.id)
            .collect();
        assert_eq!(ids, vec!["a3", "a2", "a1"]);
    }

    #[tokio::test]
    async fn test_readd_updates_in_place() {
        let db = test_db().await;
        db.add_read_later(&article("a1")).await.unwrap();

        let mut updated = article("a1");
        updated.likes_count = 99;
        db.add_read_later(&updated).await.unwrap();

        let saved = db.list_read_later().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].article.likes_count, 99);
    }

    #[tokio::test]
    async fn test_remove() {
        let db = test_db().await;
        db.add_read_later(&article("a1")).await.unwrap();

        assert!(db.remove_read_later("a1").await.unwrap());
        assert!(!db.remove_read_later("a1").await.unwrap());
        assert!(db.list_read_later().await.unwrap().is_empty());
    }
}
