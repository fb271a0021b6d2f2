//! Feed view model: query, pagination and loading state.
//!
//! Fetches run as spawned tasks and report back as [`FetchCompletion`]s on
//! an mpsc channel. The owner of the receiver (the UI loop) passes each
//! completion to [`FeedViewModel::handle_completion`], which drops anything
//! tagged with an old epoch before it can touch state.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::query::FeedQuery;
use crate::api::{ApiError, Article, ArticleSource};
use crate::util::catch_task_panic;

/// The only error kind the feed surfaces to the user.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to load articles: {0}")]
    FetchFailed(String),
}

impl From<ApiError> for FeedError {
    fn from(err: ApiError) -> Self {
        FeedError::FetchFailed(err.to_string())
    }
}

/// Which page a fetch was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    First,
    Next,
}

/// Result of one spawned fetch, sent back to the view model's owner.
#[derive(Debug)]
pub struct FetchCompletion {
    pub epoch: u64,
    pub kind: PageKind,
    pub page: u32,
    pub result: Result<Vec<Article>, ApiError>,
}

/// Discrete outputs the controller applies to its list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutput {
    /// Full first page; replaces the list.
    FirstLoad(Vec<Article>),
    /// Every article loaded for the query so far, oldest page first.
    AdditionalLoad(Vec<Article>),
    /// User-facing failure message.
    Alert(String),
}

/// Pagination state of the query whose first page succeeded last.
#[derive(Debug)]
struct PageCursor {
    query: FeedQuery,
    next_page: u32,
    loaded: Vec<Article>,
    /// Set once a next-page fetch comes back empty.
    exhausted: bool,
}

struct InFlight {
    kind: PageKind,
    handle: JoinHandle<()>,
}

pub struct FeedViewModel<S> {
    source: Arc<S>,
    completion_tx: mpsc::Sender<FetchCompletion>,
    epoch: u64,
    active: Option<FeedQuery>,
    cursor: Option<PageCursor>,
    in_flight: Option<InFlight>,
    is_loading: watch::Sender<bool>,
    has_data: watch::Sender<bool>,
}

impl<S: ArticleSource> FeedViewModel<S> {
    pub fn new(source: Arc<S>, completion_tx: mpsc::Sender<FetchCompletion>) -> Self {
        // `has_data` starts at a synthetic true so no empty state shows
        // before the first fetch finishes.
        let (is_loading, _) = watch::channel(false);
        let (has_data, _) = watch::channel(true);
        Self {
            source,
            completion_tx,
            epoch: 0,
            active: None,
            cursor: None,
            in_flight: None,
            is_loading,
            has_data,
        }
    }

    /// Make `query` the active query and fetch its first page.
    ///
    /// Any outstanding fetch is aborted, and its completion (if one is
    /// already queued) is rejected by the epoch check.
    pub fn fetch_trigger(&mut self, query: FeedQuery) {
        if let Some(prev) = self.in_flight.take() {
            prev.handle.abort();
            tracing::debug!(epoch = self.epoch, kind = ?prev.kind, "Aborted superseded fetch");
        }

        self.epoch = self.epoch.wrapping_add(1);
        tracing::info!(epoch = self.epoch, query = %query, "Fetching first page");
        self.active = Some(query.clone());
        self.spawn_fetch(query, PageKind::First, 1);
    }

    /// Fetch the next page of the active query.
    ///
    /// Returns `false` (and issues nothing) when there is no cursor for the
    /// active query, a fetch is already running, or the feed is exhausted.
    pub fn load_next_page_trigger(&mut self) -> bool {
        if self.in_flight.is_some() {
            tracing::trace!("Next page ignored: fetch in flight");
            return false;
        }
        let Some(active) = &self.active else {
            return false;
        };
        let Some(cursor) = self.cursor.as_ref().filter(|c| &c.query == active) else {
            tracing::trace!("Next page ignored: no first page for active query");
            return false;
        };
        if cursor.exhausted {
            return false;
        }

        let (query, page) = (cursor.query.clone(), cursor.next_page);
        tracing::debug!(epoch = self.epoch, page, "Fetching next page");
        self.spawn_fetch(query, PageKind::Next, page);
        true
    }

    fn spawn_fetch(&mut self, query: FeedQuery, kind: PageKind, page: u32) {
        let source = Arc::clone(&self.source);
        let tx = self.completion_tx.clone();
        let epoch = self.epoch;

        let handle = tokio::spawn(async move {
            let result = match catch_task_panic(source.fetch(&query, page)).await {
                Ok(result) => result,
                Err(panic_msg) => {
                    tracing::error!(epoch, page, error = %panic_msg, "Fetch task panicked");
                    Err(ApiError::TaskPanicked(panic_msg))
                }
            };
            let completion = FetchCompletion {
                epoch,
                kind,
                page,
                result,
            };
            if tx.send(completion).await.is_err() {
                tracing::debug!(epoch, page, "Completion dropped (receiver closed)");
            }
        });

        self.in_flight = Some(InFlight { kind, handle });
        self.is_loading.send_replace(true);
    }

    /// Apply a finished fetch. Returns the output to show, or `None` when
    /// the completion is stale.
    pub fn handle_completion(&mut self, completion: FetchCompletion) -> Option<FeedOutput> {
        let FetchCompletion {
            epoch,
            kind,
            page,
            result,
        } = completion;

        if epoch != self.epoch {
            tracing::debug!(
                expected = self.epoch,
                got = epoch,
                page,
                "Ignoring stale fetch completion"
            );
            return None;
        }

        self.in_flight = None;
        self.is_loading.send_replace(false);

        let articles = match result {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!(epoch, page, error = %e, "Fetch failed");
                return Some(FeedOutput::Alert(FeedError::from(e).to_string()));
            }
        };

        let active = self.active.clone()?;
        match kind {
            PageKind::First => {
                tracing::debug!(epoch, count = articles.len(), "First page loaded");
                self.has_data.send_replace(!articles.is_empty());
                self.cursor = Some(PageCursor {
                    query: active,
                    next_page: 2,
                    exhausted: articles.is_empty(),
                    loaded: articles.clone(),
                });
                Some(FeedOutput::FirstLoad(articles))
            }
            PageKind::Next => {
                let cursor = self.cursor.as_mut().filter(|c| c.query == active)?;
                if articles.is_empty() {
                    tracing::debug!(epoch, page, "Reached end of feed");
                    cursor.exhausted = true;
                }
                cursor.loaded.extend(articles);
                cursor.next_page += 1;
                tracing::debug!(epoch, page, total = cursor.loaded.len(), "Next page loaded");
                self.has_data.send_replace(!cursor.loaded.is_empty());
                Some(FeedOutput::AdditionalLoad(cursor.loaded.clone()))
            }
        }
    }

    /// Level signal: false when the last completed fetch produced nothing.
    ///
    /// The initial synthetic value is already marked seen on the returned
    /// receiver, so `has_changed` only reports real results.
    pub fn subscribe_has_data(&self) -> watch::Receiver<bool> {
        self.has_data.subscribe()
    }

    /// Level signal: true while a fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        *self.is_loading.borrow()
    }

    pub fn has_data(&self) -> bool {
        *self.has_data.borrow()
    }

    pub fn active_query(&self) -> Option<&FeedQuery> {
        self.active.as_ref()
    }

    /// Next page number that would be requested for the active query.
    pub fn next_page(&self) -> Option<u32> {
        let active = self.active.as_ref()?;
        self.cursor
            .as_ref()
            .filter(|c| &c.query == active)
            .map(|c| c.next_page)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl<S> Drop for FeedViewModel<S> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }
}
