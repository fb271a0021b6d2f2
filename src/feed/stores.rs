//! Collaborator interfaces the feed controller depends on.
//!
//! `storage::Database` implements all three; tests substitute their own.

use anyhow::Result;
use std::future::Future;

use super::query::{FeedQuery, SearchPeriod, SearchSort};
use crate::api::Article;

/// Persisted search settings.
pub trait SettingsStore {
    fn current_tag(&self) -> impl Future<Output = Result<Option<String>>> + Send;
    fn set_current_tag(&self, tag: &str) -> impl Future<Output = Result<()>> + Send;
    fn search_sort(&self) -> impl Future<Output = Result<SearchSort>> + Send;
    fn set_search_sort(&self, sort: SearchSort) -> impl Future<Output = Result<()>> + Send;
    fn search_period(&self) -> impl Future<Output = Result<SearchPeriod>> + Send;
    fn set_search_period(&self, period: SearchPeriod) -> impl Future<Output = Result<()>> + Send;

    /// The full query the feed should show right now.
    fn current_query(&self) -> impl Future<Output = Result<FeedQuery>> + Send
    where
        Self: Sync,
    {
        async move {
            let tag = self.current_tag().await?.unwrap_or_default();
            let sort = self.search_sort().await?;
            let period = self.search_period().await?;
            Ok(FeedQuery::new(tag, sort, period))
        }
    }
}

/// Articles the user saved for later.
pub trait ReadLaterStore {
    fn add_read_later(&self, article: &Article) -> impl Future<Output = Result<()>> + Send;
}

/// Ordered set of previously searched tags, most recent first.
pub trait SearchHistoryStore {
    fn add_search_history(&self, tag: &str) -> impl Future<Output = Result<()>> + Send;
    fn search_history(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Everything the controller needs from persistence.
pub trait FeedStore: SettingsStore + ReadLaterStore + SearchHistoryStore + Sync {}

impl<T> FeedStore for T where T: SettingsStore + ReadLaterStore + SearchHistoryStore + Sync {}
