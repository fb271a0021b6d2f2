//! Feed controller: owns the on-screen article list.
//!
//! Translates user actions into view-model triggers and view-model outputs
//! into list mutations. Each mutation is reported as a [`ListUpdate`] so
//! the renderer knows whether rows were replaced, appended or removed.

use std::ops::Range;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use super::query::FeedQuery;
use super::stores::FeedStore;
use super::view_model::{FeedOutput, FeedViewModel, FetchCompletion};
use crate::api::{Article, ArticleSource};

/// Selection within this many rows of the end triggers the next page.
pub const SCROLL_THRESHOLD: usize = 3;

/// How the display list changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListUpdate {
    /// Nothing changed.
    None,
    /// The whole list was replaced.
    Reload,
    /// Rows were appended at this index range.
    Insert(Range<usize>),
    /// The row at this index was removed.
    Remove(usize),
    /// A removed row was put back at this index.
    Restore(usize),
}

pub struct FeedController<S, D> {
    view_model: FeedViewModel<S>,
    store: D,
    articles: Vec<Article>,
    /// Length of the cumulative set the list last caught up with.
    consumed: usize,
    selected: usize,
    list_visible: bool,
    show_empty: bool,
    alert: Option<String>,
    has_data_rx: watch::Receiver<bool>,
}

impl<S: ArticleSource, D: FeedStore> FeedController<S, D> {
    pub fn new(source: Arc<S>, store: D, completion_tx: mpsc::Sender<FetchCompletion>) -> Self {
        let view_model = FeedViewModel::new(source, completion_tx);
        let has_data_rx = view_model.subscribe_has_data();
        Self {
            view_model,
            store,
            articles: Vec::new(),
            consumed: 0,
            selected: 0,
            list_visible: false,
            show_empty: false,
            alert: None,
            has_data_rx,
        }
    }

    /// Pull-to-refresh and initial appearance: reload the stored query.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored search settings cannot be read.
    pub async fn refresh(&mut self) -> anyhow::Result<()> {
        let query = self.store.current_query().await?;
        tracing::debug!(query = %query, "Refreshing feed");
        self.view_model.fetch_trigger(query);
        Ok(())
    }

    /// Search submission or history selection.
    ///
    /// The tag is stored as the current tag and recorded in history before
    /// the fetch starts. The list stays hidden until the first page lands.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be stored or the stored sort and
    /// period cannot be read back. A history write failure is only logged.
    pub async fn search(&mut self, tag: &str) -> anyhow::Result<()> {
        let tag = tag.trim();
        self.store.set_current_tag(tag).await?;
        if let Err(e) = self.store.add_search_history(tag).await {
            tracing::warn!(tag, error = %e, "Failed to record search history");
        }

        let query = self.store.current_query().await?;
        tracing::info!(query = %query, "Searching");
        self.list_visible = false;
        self.view_model.fetch_trigger(query);
        Ok(())
    }

    /// Scroll reached the bottom. Returns whether a request was issued.
    pub fn load_next_page(&mut self) -> bool {
        self.view_model.load_next_page_trigger()
    }

    /// Feed a finished fetch through the view model and apply the output.
    pub fn handle_completion(&mut self, completion: FetchCompletion) -> ListUpdate {
        let update = match self.view_model.handle_completion(completion) {
            Some(output) => self.apply(output),
            None => ListUpdate::None,
        };
        self.sync_empty_state();
        update
    }

    /// Apply one view-model output to the display list.
    pub fn apply(&mut self, output: FeedOutput) -> ListUpdate {
        match output {
            FeedOutput::FirstLoad(articles) => {
                self.consumed = articles.len();
                self.articles = articles;
                self.selected = 0;
                self.list_visible = true;
                ListUpdate::Reload
            }
            FeedOutput::AdditionalLoad(cumulative) => {
                let new_items = cumulative.get(self.consumed..).unwrap_or_default();
                let start = self.articles.len();
                self.articles.extend_from_slice(new_items);
                self.consumed = cumulative.len();
                if self.articles.len() == start {
                    ListUpdate::None
                } else {
                    ListUpdate::Insert(start..self.articles.len())
                }
            }
            FeedOutput::Alert(message) => {
                self.alert = Some(message);
                // A failed search brings the previous list back.
                self.list_visible = true;
                ListUpdate::None
            }
        }
    }

    /// Pick up `has_data` changes. The initial synthetic value never
    /// registers as a change, so the empty state cannot flash at start-up.
    fn sync_empty_state(&mut self) {
        if self.has_data_rx.has_changed().unwrap_or(false) {
            self.show_empty = !*self.has_data_rx.borrow_and_update();
        }
    }

    /// Remove the row at `index` and save it for later.
    ///
    /// If the store rejects it, the row goes back where it was and an alert
    /// is raised.
    pub async fn save_for_later(&mut self, index: usize) -> ListUpdate {
        if index >= self.articles.len() {
            return ListUpdate::None;
        }

        let article = self.articles.remove(index);
        self.clamp_selection();

        match self.store.add_read_later(&article).await {
            Ok(()) => {
                tracing::info!(id = %article.id, "Saved article for later");
                ListUpdate::Remove(index)
            }
            Err(e) => {
                tracing::error!(id = %article.id, error = %e, "Failed to save article for later");
                self.alert = Some(format!("Could not save \"{}\": {}", article.title, e));
                self.articles.insert(index, article);
                ListUpdate::Restore(index)
            }
        }
    }

    /// Move the selection down; asks for the next page near the end.
    pub fn select_next(&mut self) {
        if self.articles.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.articles.len() - 1);
        if self.selected + SCROLL_THRESHOLD >= self.articles.len() {
            self.load_next_page();
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.articles.len().saturating_sub(1));
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.articles.get(self.selected)
    }

    /// URL to open for the row at `index`. Selecting a row never changes
    /// the list.
    pub fn article_url(&self, index: usize) -> Option<&str> {
        self.articles.get(index).map(|a| a.url.as_str())
    }

    pub fn is_list_visible(&self) -> bool {
        self.list_visible
    }

    /// Empty-state placeholder; hidden while a fetch is outstanding.
    pub fn show_empty(&self) -> bool {
        self.show_empty && !self.is_loading()
    }

    pub fn is_loading(&self) -> bool {
        self.view_model.is_loading()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn active_query(&self) -> Option<&FeedQuery> {
        self.view_model.active_query()
    }

    pub fn next_page(&self) -> Option<u32> {
        self.view_model.next_page()
    }

    pub fn store(&self) -> &D {
        &self.store
    }
}
