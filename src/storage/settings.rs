use anyhow::Result;
use std::str::FromStr;

use super::schema::Database;
use crate::feed::{SearchPeriod, SearchSort, SettingsStore};

const KEY_TAG: &str = "search.tag";
const KEY_SORT: &str = "search.sort";
const KEY_PERIOD: &str = "search.period";

impl Database {
    // ========================================================================
    // User Preferences Operations
    // ========================================================================

    /// Get a single preference value by key.
    ///
    /// Keys use dotted convention: `search.tag`, `search.sort`, ...
    pub async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM user_preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a preference value (UPSERT).
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Read an enum preference, falling back to its default when missing or
    /// unrecognised.
    async fn get_choice<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr + Default,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.get_preference(key).await? else {
            return Ok(T::default());
        };
        Ok(raw.parse().unwrap_or_else(|e| {
            tracing::warn!(key, value = %raw, error = %e, "Ignoring stored preference");
            T::default()
        }))
    }
}

impl SettingsStore for Database {
    async fn current_tag(&self) -> Result<Option<String>> {
        Ok(self
            .get_preference(KEY_TAG)
            .await?
            .filter(|tag| !tag.trim().is_empty()))
    }

    async fn set_current_tag(&self, tag: &str) -> Result<()> {
        self.set_preference(KEY_TAG, tag.trim()).await
    }

    async fn search_sort(&self) -> Result<SearchSort> {
        self.get_choice(KEY_SORT).await
    }

    async fn set_search_sort(&self, sort: SearchSort) -> Result<()> {
        self.set_preference(KEY_SORT, sort.as_str()).await
    }

    async fn search_period(&self) -> Result<SearchPeriod> {
        self.get_choice(KEY_PERIOD).await
    }

    async fn set_search_period(&self, period: SearchPeriod) -> Result<()> {
        self.set_preference(KEY_PERIOD, period.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedQuery;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_preference_missing() {
        let db = test_db().await;
        assert_eq!(db.get_preference("nonexistent.key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_preference_upsert() {
        let db = test_db().await;
        db.set_preference("search.tag", "rust").await.unwrap();
        db.set_preference("search.tag", "swift").await.unwrap();

        let value = db.get_preference("search.tag").await.unwrap();
        assert_eq!(value, Some("swift".to_string()));
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let db = test_db().await;
        assert_eq!(db.current_tag().await.unwrap(), None);
        assert_eq!(db.search_sort().await.unwrap(), SearchSort::Recent);
        assert_eq!(db.search_period().await.unwrap(), SearchPeriod::All);
        assert_eq!(db.current_query().await.unwrap(), FeedQuery::default());
    }

    #[tokio::test]
    async fn test_settings_round_trip_into_query() {
        let db = test_db().await;
        db.set_current_tag(" go ").await.unwrap();
        db.set_search_sort(SearchSort::Popular).await.unwrap();
        db.set_search_period(SearchPeriod::Week).await.unwrap();

        assert_eq!(
            db.current_query().await.unwrap(),
            FeedQuery::new("go", SearchSort::Popular, SearchPeriod::Week)
        );
    }

    #[tokio::test]
    async fn test_blank_tag_reads_as_none() {
        let db = test_db().await;
        db.set_current_tag("   ").await.unwrap();
        assert_eq!(db.current_tag().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_stored_value_falls_back() {
        let db = test_db().await;
        db.set_preference("search.sort", "trending").await.unwrap();
        assert_eq!(db.search_sort().await.unwrap(), SearchSort::Recent);
    }
}
