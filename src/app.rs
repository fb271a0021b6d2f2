use crate::api::{ArticleSource, QiitaClient};
use crate::feed::{
    FeedController, FetchCompletion, ListUpdate, SearchHistoryStore, SearchPeriod, SearchSort,
    SettingsStore,
};
use crate::storage::{Database, SavedArticle};
use crate::util::{validate_url_for_open, MAX_TAG_LENGTH};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Seconds a status message stays visible.
const STATUS_TTL_SECS: u64 = 3;

/// Number of frames in the loading spinner animation.
pub const SPINNER_FRAMES: usize = 10;

// ============================================================================
// View and Overlay State
// ============================================================================

/// Current top-level view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Feed,
    ReadLater,
}

/// Which control of the search overlay has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Tag,
    Sort,
    Period,
    History,
}

impl SearchField {
    pub fn next(self) -> Self {
        match self {
            SearchField::Tag => SearchField::Sort,
            SearchField::Sort => SearchField::Period,
            SearchField::Period => SearchField::History,
            SearchField::History => SearchField::Tag,
        }
    }
}

/// State of the search overlay while it is open.
#[derive(Debug, Clone)]
pub struct SearchOverlay {
    pub input: String,
    pub focus: SearchField,
    pub sort: SearchSort,
    pub period: SearchPeriod,
    pub history: Vec<String>,
    pub history_selected: usize,
}

impl SearchOverlay {
    /// Append a character, refusing control characters and overlong tags.
    pub fn push_char(&mut self, c: char) -> bool {
        if c.is_control() || self.input.chars().count() >= MAX_TAG_LENGTH {
            return false;
        }
        self.input.push(c);
        true
    }

    pub fn cycle_sort(&mut self, forward: bool) {
        self.sort = cycle(&SearchSort::ALL, self.sort, forward);
    }

    pub fn cycle_period(&mut self, forward: bool) {
        self.period = cycle(&SearchPeriod::ALL, self.period, forward);
    }

    pub fn history_down(&mut self) {
        if !self.history.is_empty() {
            self.history_selected = (self.history_selected + 1).min(self.history.len() - 1);
        }
    }

    pub fn history_up(&mut self) {
        self.history_selected = self.history_selected.saturating_sub(1);
    }

    pub fn selected_history(&self) -> Option<&str> {
        self.history.get(self.history_selected).map(String::as_str)
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % all.len()
    } else {
        (idx + all.len() - 1) % all.len()
    };
    all[next]
}

// ============================================================================
// App
// ============================================================================

pub struct App<S = QiitaClient> {
    pub db: Database,
    pub feed: FeedController<S, Database>,
    pub view: View,
    pub search: Option<SearchOverlay>,

    pub read_later: Vec<SavedArticle>,
    pub read_later_selected: usize,

    /// Status message with the time it was set; expires after 3 seconds.
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Skip frames when nothing changed.
    pub needs_redraw: bool,

    /// Advanced by the tick handler while a fetch is running.
    pub spinner_frame: usize,
}

impl<S: ArticleSource> App<S> {
    pub fn new(db: Database, source: Arc<S>, completion_tx: mpsc::Sender<FetchCompletion>) -> Self {
        let feed = FeedController::new(source, db.clone(), completion_tx);
        Self {
            db,
            feed,
            view: View::Feed,
            search: None,
            read_later: Vec::new(),
            read_later_selected: 0,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
        }
    }

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear status message if expired. Returns true if a message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Advance the spinner while loading. Returns true if a frame changed.
    pub fn tick_spinner(&mut self) -> bool {
        if self.feed.is_loading() {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES;
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------------
    // Feed
    // ------------------------------------------------------------------------

    /// Reload the stored query from page 1.
    pub async fn refresh(&mut self) {
        if let Err(e) = self.feed.refresh().await {
            tracing::error!(error = %e, "Failed to read search settings");
            self.set_status(format!("Could not read settings: {e}"));
        }
    }

    pub fn handle_completion(&mut self, completion: FetchCompletion) -> ListUpdate {
        let update = self.feed.handle_completion(completion);
        self.needs_redraw = true;
        update
    }

    /// Swipe-to-save on the selected feed row.
    pub async fn save_selected_for_later(&mut self) {
        let index = self.feed.selected();
        let title = self.feed.selected_article().map(|a| a.title.clone());
        if let ListUpdate::Remove(_) = self.feed.save_for_later(index).await {
            if let Some(title) = title {
                self.set_status(format!("Saved for later: {title}"));
            }
        }
    }

    /// Open the selected feed row in the browser.
    pub fn open_selected(&mut self) {
        let url = self.feed.article_url(self.feed.selected()).map(str::to_string);
        match url {
            Some(url) => self.open_url(&url),
            None => self.set_status("No article selected"),
        }
    }

    fn open_url(&mut self, url: &str) {
        if let Err(msg) = validate_url_for_open(url) {
            tracing::warn!(url, "Refusing to open URL");
            self.set_status(msg);
        } else if let Err(e) = open::that(url) {
            tracing::warn!(url, error = %e, "Failed to open browser");
            self.set_status(format!("Failed to open browser: {e}"));
        } else {
            self.set_status("Opened in browser");
        }
    }

    // ------------------------------------------------------------------------
    // Search overlay
    // ------------------------------------------------------------------------

    /// Open the search overlay pre-filled from stored settings and history.
    pub async fn open_search(&mut self) {
        let tag = self.db.current_tag().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read current tag");
            None
        });
        let sort = self.db.search_sort().await.unwrap_or_default();
        let period = self.db.search_period().await.unwrap_or_default();
        let history = match self.db.search_history().await {
            Ok(history) => history,
            Err(e) => {
                self.set_status(format!("Could not load search history: {e}"));
                Vec::new()
            }
        };

        self.search = Some(SearchOverlay {
            input: tag.unwrap_or_default(),
            focus: SearchField::Tag,
            sort,
            period,
            history,
            history_selected: 0,
        });
        self.needs_redraw = true;
    }

    /// Cycle the focused sort or period selector and store the choice
    /// right away, so cancelling the overlay keeps it.
    pub async fn cycle_search_choice(&mut self, forward: bool) {
        let Some(overlay) = self.search.as_mut() else {
            return;
        };
        let saved = match overlay.focus {
            SearchField::Sort => {
                overlay.cycle_sort(forward);
                let sort = overlay.sort;
                self.db.set_search_sort(sort).await
            }
            SearchField::Period => {
                overlay.cycle_period(forward);
                let period = overlay.period;
                self.db.set_search_period(period).await
            }
            SearchField::Tag | SearchField::History => return,
        };
        if let Err(e) = saved {
            tracing::warn!(error = %e, "Failed to store search setting");
            self.set_status(format!("Could not save search setting: {e}"));
        }
        self.needs_redraw = true;
    }

    pub fn close_search(&mut self) {
        self.search = None;
        self.needs_redraw = true;
    }

    /// Submit the overlay: the typed tag, or the highlighted history entry
    /// when the history list has focus.
    pub async fn submit_search(&mut self) {
        let Some(overlay) = self.search.take() else {
            return;
        };

        let tag = match overlay.focus {
            SearchField::History => match overlay.selected_history() {
                Some(tag) => tag.to_string(),
                None => overlay.input.clone(),
            },
            _ => overlay.input.clone(),
        };

        if let Err(e) = self.db.set_search_sort(overlay.sort).await {
            self.set_status(format!("Could not save sort order: {e}"));
        }
        if let Err(e) = self.db.set_search_period(overlay.period).await {
            self.set_status(format!("Could not save period: {e}"));
        }
        if let Err(e) = self.feed.search(&tag).await {
            tracing::error!(tag = %tag, error = %e, "Search failed to start");
            self.set_status(format!("Could not start search: {e}"));
        }

        self.view = View::Feed;
        self.needs_redraw = true;
    }

    // ------------------------------------------------------------------------
    // Read later
    // ------------------------------------------------------------------------

    pub async fn show_read_later(&mut self) {
        self.reload_read_later().await;
        self.view = View::ReadLater;
        self.needs_redraw = true;
    }

    pub fn show_feed(&mut self) {
        self.view = View::Feed;
        self.needs_redraw = true;
    }

    async fn reload_read_later(&mut self) {
        match self.db.list_read_later().await {
            Ok(list) => self.read_later = list,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load read-later list");
                self.set_status(format!("Could not load saved articles: {e}"));
            }
        }
        self.read_later_selected = self
            .read_later_selected
            .min(self.read_later.len().saturating_sub(1));
    }

    pub fn read_later_down(&mut self) {
        if !self.read_later.is_empty() {
            self.read_later_selected = (self.read_later_selected + 1).min(self.read_later.len() - 1);
        }
    }

    pub fn read_later_up(&mut self) {
        self.read_later_selected = self.read_later_selected.saturating_sub(1);
    }

    pub async fn remove_selected_read_later(&mut self) {
        let Some(saved) = self.read_later.get(self.read_later_selected) else {
            return;
        };
        let id = saved.article.id.clone();
        match self.db.remove_read_later(&id).await {
            Ok(_) => {
                self.set_status("Removed from Read Later");
                self.reload_read_later().await;
            }
            Err(e) => self.set_status(format!("Could not remove article: {e}")),
        }
    }

    pub fn open_selected_read_later(&mut self) {
        let url = self
            .read_later
            .get(self.read_later_selected)
            .map(|s| s.article.url.clone());
        match url {
            Some(url) => self.open_url(&url),
            None => self.set_status("No article selected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, Article};
    use crate::feed::{FeedQuery, ReadLaterStore};
    use tokio::time::{self, Duration};

    struct EmptySource;

    impl ArticleSource for EmptySource {
        async fn fetch(&self, _query: &FeedQuery, _page: u32) -> Result<Vec<Article>, ApiError> {
            Ok(Vec::new())
        }
    }

    async fn test_app() -> (App<EmptySource>, mpsc::Receiver<FetchCompletion>) {
        let db = Database::open(":memory:").await.unwrap();
        let (tx, rx) = mpsc::channel(8);
        (App::new(db, Arc::new(EmptySource), tx), rx)
    }

    fn article(id: &str) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Title {id}"),
            url: format!("https://qiita.com/u/items/{id}"),
            author: "u".to_string(),
            tags: vec![],
            likes_count: 0,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        // Create app before pausing time to avoid DB connection timeout
        let (mut app, _rx) = test_app().await;
        time::pause();
        app.set_status("Test message");

        time::advance(Duration::from_secs(2)).await;
        assert!(!app.clear_expired_status());
        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_spinner_only_moves_while_loading() {
        let (mut app, mut rx) = test_app().await;
        assert!(!app.tick_spinner());

        app.refresh().await;
        assert!(app.tick_spinner());
        assert_eq!(app.spinner_frame, 1);

        let completion = rx.recv().await.unwrap();
        app.handle_completion(completion);
        assert!(!app.tick_spinner());
    }

    #[test]
    fn test_search_field_cycle() {
        let mut field = SearchField::Tag;
        for _ in 0..4 {
            field = field.next();
        }
        assert_eq!(field, SearchField::Tag);
    }

    #[tokio::test]
    async fn test_open_search_prefills_from_store() {
        let (mut app, _rx) = test_app().await;
        app.db.set_current_tag("rust").await.unwrap();
        app.db.set_search_sort(SearchSort::Popular).await.unwrap();
        app.db.add_search_history("go").await.unwrap();

        app.open_search().await;
        let overlay = app.search.as_ref().unwrap();
        assert_eq!(overlay.input, "rust");
        assert_eq!(overlay.sort, SearchSort::Popular);
        assert_eq!(overlay.period, SearchPeriod::All);
        assert_eq!(overlay.history, vec!["go".to_string()]);
    }

    #[tokio::test]
    async fn test_overlay_input_limits() {
        let (mut app, _rx) = test_app().await;
        app.open_search().await;
        let overlay = app.search.as_mut().unwrap();

        assert!(!overlay.push_char('\u{1b}'));
        for _ in 0..MAX_TAG_LENGTH {
            assert!(overlay.push_char('a'));
        }
        assert!(!overlay.push_char('a'));
    }

    #[tokio::test]
    async fn test_overlay_cycles_wrap() {
        let (mut app, _rx) = test_app().await;
        app.open_search().await;
        let overlay = app.search.as_mut().unwrap();

        overlay.cycle_period(false);
        assert_eq!(overlay.period, SearchPeriod::Week);
        overlay.cycle_period(true);
        assert_eq!(overlay.period, SearchPeriod::All);
        overlay.cycle_sort(true);
        assert_eq!(overlay.sort, SearchSort::Popular);
    }

    #[tokio::test]
    async fn test_cancelled_search_keeps_selector_changes() {
        let (mut app, _rx) = test_app().await;
        app.open_search().await;

        app.search.as_mut().unwrap().focus = SearchField::Sort;
        app.cycle_search_choice(true).await;
        app.search.as_mut().unwrap().focus = SearchField::Period;
        app.cycle_search_choice(false).await;
        app.close_search();

        assert_eq!(app.db.search_sort().await.unwrap(), SearchSort::Popular);
        assert_eq!(app.db.search_period().await.unwrap(), SearchPeriod::Week);
    }

    #[tokio::test]
    async fn test_cycle_with_tag_focus_stores_nothing() {
        let (mut app, _rx) = test_app().await;
        app.open_search().await;
        app.cycle_search_choice(true).await;

        assert_eq!(app.search.as_ref().unwrap().sort, SearchSort::Recent);
        assert_eq!(app.db.search_sort().await.unwrap(), SearchSort::Recent);
    }

    #[tokio::test]
    async fn test_submit_search_persists_and_closes() {
        let (mut app, _rx) = test_app().await;
        app.open_search().await;
        {
            let overlay = app.search.as_mut().unwrap();
            overlay.input = "swift".into();
            overlay.period = SearchPeriod::Month;
        }

        app.submit_search().await;

        assert!(app.search.is_none());
        assert_eq!(app.db.current_tag().await.unwrap(), Some("swift".into()));
        assert_eq!(app.db.search_period().await.unwrap(), SearchPeriod::Month);
        assert_eq!(app.db.search_history().await.unwrap(), vec!["swift"]);
        assert_eq!(
            app.feed.active_query(),
            Some(&FeedQuery::new("swift", SearchSort::Recent, SearchPeriod::Month))
        );
    }

    #[tokio::test]
    async fn test_submit_from_history_uses_highlighted_tag() {
        let (mut app, _rx) = test_app().await;
        app.db.add_search_history("rust").await.unwrap();
        app.db.add_search_history("go").await.unwrap();
        app.open_search().await;
        {
            let overlay = app.search.as_mut().unwrap();
            overlay.input = "typed".into();
            overlay.focus = SearchField::History;
            overlay.history_down();
        }

        app.submit_search().await;

        assert_eq!(app.db.current_tag().await.unwrap(), Some("rust".into()));
        assert_eq!(app.db.search_history().await.unwrap(), vec!["rust", "go"]);
    }

    #[tokio::test]
    async fn test_read_later_view_and_remove() {
        let (mut app, _rx) = test_app().await;
        app.db.add_read_later(&article("a")).await.unwrap();
        app.db.add_read_later(&article("b")).await.unwrap();

        app.show_read_later().await;
        assert_eq!(app.view, View::ReadLater);
        assert_eq!(app.read_later.len(), 2);

        app.read_later_down();
        app.remove_selected_read_later().await;
        assert_eq!(app.read_later.len(), 1);
        assert_eq!(app.read_later_selected, 0);

        app.show_feed();
        assert_eq!(app.view, View::Feed);
    }

    #[tokio::test]
    async fn test_open_rejects_unsafe_url() {
        let (mut app, _rx) = test_app().await;
        app.open_url("javascript:alert(1)");
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert!(msg.starts_with("Refusing to open URL"));
    }

    #[tokio::test]
    async fn test_open_with_empty_feed_sets_status() {
        let (mut app, _rx) = test_app().await;
        app.open_selected();
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert_eq!(msg, "No article selected");
    }
}
