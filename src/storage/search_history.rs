use anyhow::Result;

use super::schema::Database;
use crate::feed::SearchHistoryStore;

impl Database {
    // ========================================================================
    // Search History Operations
    // ========================================================================

    /// Record a searched tag and trim the history to `history_limit`.
    ///
    /// Blank tags are ignored. A tag already in the history moves to the
    /// front.
    pub async fn record_search(&self, tag: &str) -> Result<()> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        // Ordered by a monotonic sequence rather than wall-clock time.
        let next: (i64,) =
            sqlx::query_as("SELECT COALESCE(MAX(seq), 0) + 1 FROM search_history")
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query(
            r#"
            INSERT INTO search_history (tag, seq) VALUES (?, ?)
            ON CONFLICT(tag) DO UPDATE SET seq = excluded.seq
        "#,
        )
        .bind(tag)
        .bind(next.0)
        .execute(&mut *tx)
        .await?;

        let limit = i64::try_from(self.history_limit).unwrap_or(i64::MAX);
        sqlx::query(
            r#"
            DELETE FROM search_history WHERE tag NOT IN (
                SELECT tag FROM search_history ORDER BY seq DESC LIMIT ?
            )
        "#,
        )
        .bind(limit)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Searched tags, most recent first.
    pub async fn get_search_history(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT tag FROM search_history ORDER BY seq DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(tag,)| tag).collect())
    }

    /// Drop every recorded tag (`qpocket --clear-history`).
    pub async fn clear_search_history(&self) -> Result<()> {
        sqlx::query("DELETE FROM search_history")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl SearchHistoryStore for Database {
    async fn add_search_history(&self, tag: &str) -> Result<()> {
        self.record_search(tag).await
    }

    async fn search_history(&self) -> Result<Vec<String>> {
        self.get_search_history().await
    }
}
