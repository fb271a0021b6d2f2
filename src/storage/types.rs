use thiserror::Error;

use crate::api::Article;

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of qpocket appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Map lock-related sqlx errors to `InstanceLocked`.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

/// An article saved for later, with the time it was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArticle {
    pub article: Article,
    pub saved_at: i64,
}

/// Row shape of `read_later` (used by sqlx FromRow).
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReadLaterRow {
    pub id: String,
    pub title: String,
    pub url: String,
    pub author: String,
    pub tags: String,
    pub likes_count: i64,
    pub created_at: Option<i64>,
    pub saved_at: i64,
}

impl ReadLaterRow {
    /// Unreadable tag JSON degrades to no tags rather than hiding the row.
    pub(crate) fn into_saved(self) -> SavedArticle {
        let tags = serde_json::from_str(&self.tags).unwrap_or_else(|e| {
            tracing::warn!(id = %self.id, error = %e, "Unreadable tags in read_later row");
            Vec::new()
        });
        SavedArticle {
            article: Article {
                id: self.id,
                title: self.title,
                url: self.url,
                author: self.author,
                tags,
                likes_count: self.likes_count,
                created_at: self.created_at,
            },
            saved_at: self.saved_at,
        }
    }
}
