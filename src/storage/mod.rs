//! SQLite persistence: search settings, read-later list and search history.

mod read_later;
mod schema;
mod search_history;
mod settings;
mod types;

pub use schema::{Database, DEFAULT_HISTORY_LIMIT};
pub use types::{DatabaseError, SavedArticle};
