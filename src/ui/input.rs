//! Input handling for the TUI.
//!
//! Keys go to the topmost layer first: alert, then search overlay, then the
//! active view.

use crate::api::ArticleSource;
use crate::app::{App, SearchField, View};
use crossterm::event::{KeyCode, KeyModifiers};

use super::Action;

/// Main input dispatch function.
pub(super) async fn handle_input<S: ArticleSource>(
    app: &mut App<S>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Action::Quit;
    }

    if app.feed.alert().is_some() {
        if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.feed.dismiss_alert();
        }
        return Action::Continue;
    }

    if app.search.is_some() {
        handle_search_input(app, code).await;
        return Action::Continue;
    }

    match app.view {
        View::Feed => handle_feed_input(app, code).await,
        View::ReadLater => handle_read_later_input(app, code).await,
    }
}

async fn handle_feed_input<S: ArticleSource>(app: &mut App<S>, code: KeyCode) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => app.feed.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.feed.select_prev(),
        KeyCode::Char('g') | KeyCode::Home => app.feed.select_first(),
        KeyCode::Char('r') => app.refresh().await,
        KeyCode::Char('/') | KeyCode::Char('s') => app.open_search().await,
        KeyCode::Enter | KeyCode::Char('o') => app.open_selected(),
        KeyCode::Char('l') | KeyCode::Char('d') => app.save_selected_for_later().await,
        KeyCode::Tab | KeyCode::Char('2') => app.show_read_later().await,
        _ => {}
    }
    Action::Continue
}

async fn handle_read_later_input<S: ArticleSource>(app: &mut App<S>, code: KeyCode) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => app.read_later_down(),
        KeyCode::Char('k') | KeyCode::Up => app.read_later_up(),
        KeyCode::Enter | KeyCode::Char('o') => app.open_selected_read_later(),
        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected_read_later().await,
        KeyCode::Tab | KeyCode::Char('1') | KeyCode::Esc => app.show_feed(),
        _ => {}
    }
    Action::Continue
}

/// Sort or period selector has focus.
fn on_selector<S>(app: &App<S>) -> bool {
    matches!(
        app.search.as_ref().map(|o| o.focus),
        Some(SearchField::Sort | SearchField::Period)
    )
}

async fn handle_search_input<S: ArticleSource>(app: &mut App<S>, code: KeyCode) {
    match code {
        KeyCode::Esc => app.close_search(),
        KeyCode::Enter => app.submit_search().await,
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if on_selector(app) => {
            app.cycle_search_choice(code != KeyCode::Left).await;
        }
        _ => {
            let Some(overlay) = app.search.as_mut() else {
                return;
            };
            match (overlay.focus, code) {
                (_, KeyCode::Tab) => overlay.focus = overlay.focus.next(),
                (SearchField::Tag, KeyCode::Backspace) => {
                    overlay.input.pop();
                }
                (SearchField::Tag, KeyCode::Char(c)) => {
                    overlay.push_char(c);
                }
                (SearchField::Tag, KeyCode::Down) => overlay.focus = SearchField::History,
                (SearchField::History, KeyCode::Down | KeyCode::Char('j')) => overlay.history_down(),
                (SearchField::History, KeyCode::Up | KeyCode::Char('k')) => overlay.history_up(),
                _ => {}
            }
            app.needs_redraw = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, Article};
    use crate::feed::{FeedOutput, FeedQuery, FetchCompletion, SettingsStore};
    use crate::storage::Database;
    use std::sync::Arc;
    use tokio::sync::mpsc;

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

    async fn press(app: &mut App<EmptySource>, code: KeyCode) -> Action {
        handle_input(app, code, KeyModifiers::NONE).await
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut app, _rx) = test_app().await;
        assert!(matches!(press(&mut app, KeyCode::Char('q')).await, Action::Quit));
        assert!(matches!(
            handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL).await,
            Action::Quit
        ));
    }

    #[tokio::test]
    async fn test_typing_in_overlay_does_not_quit() {
        let (mut app, _rx) = test_app().await;
        press(&mut app, KeyCode::Char('/')).await;
        assert!(app.search.is_some());

        for c in "qiita".chars() {
            assert!(matches!(press(&mut app, KeyCode::Char(c)).await, Action::Continue));
        }
        press(&mut app, KeyCode::Backspace).await;
        assert_eq!(app.search.as_ref().unwrap().input, "qiit");

        press(&mut app, KeyCode::Esc).await;
        assert!(app.search.is_none());
    }

    #[tokio::test]
    async fn test_enter_submits_search() {
        let (mut app, _rx) = test_app().await;
        press(&mut app, KeyCode::Char('/')).await;
        for c in "rust".chars() {
            press(&mut app, KeyCode::Char(c)).await;
        }
        press(&mut app, KeyCode::Tab).await;
        press(&mut app, KeyCode::Right).await;
        press(&mut app, KeyCode::Enter).await;

        assert!(app.search.is_none());
        assert_eq!(app.db.current_tag().await.unwrap(), Some("rust".into()));
        assert_eq!(
            app.db.search_sort().await.unwrap(),
            crate::feed::SearchSort::Popular
        );
    }

    #[tokio::test]
    async fn test_escape_keeps_changed_period() {
        let (mut app, _rx) = test_app().await;
        press(&mut app, KeyCode::Char('/')).await;
        press(&mut app, KeyCode::Tab).await;
        press(&mut app, KeyCode::Tab).await;
        press(&mut app, KeyCode::Char(' ')).await;
        press(&mut app, KeyCode::Esc).await;

        assert!(app.search.is_none());
        assert_eq!(
            app.db.search_period().await.unwrap(),
            crate::feed::SearchPeriod::Month
        );
        assert_eq!(app.db.current_tag().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_alert_captures_keys_until_dismissed() {
        let (mut app, _rx) = test_app().await;
        app.feed
            .apply(FeedOutput::Alert("Failed to load articles: boom".into()));

        assert!(matches!(press(&mut app, KeyCode::Char('q')).await, Action::Continue));
        assert!(app.feed.alert().is_some());

        press(&mut app, KeyCode::Enter).await;
        assert!(app.feed.alert().is_none());
    }

    #[tokio::test]
    async fn test_tab_switches_views() {
        let (mut app, _rx) = test_app().await;
        press(&mut app, KeyCode::Tab).await;
        assert_eq!(app.view, View::ReadLater);
        press(&mut app, KeyCode::Tab).await;
        assert_eq!(app.view, View::Feed);
    }
}
