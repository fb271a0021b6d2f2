use crate::api::ArticleSource;
use crate::app::{App, View};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Render the status bar
pub fn render<S: ArticleSource>(f: &mut Frame, app: &App<S>, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.search.is_some() {
        Cow::Borrowed("[Tab]field [←/→]change [↑/↓]history [Enter]search [Esc]cancel")
    } else {
        match app.view {
            View::Feed if app.feed.is_loading() => Cow::Owned(format!(
                "{} Loading...",
                SPINNER[app.spinner_frame % SPINNER.len()]
            )),
            View::Feed => Cow::Borrowed(
                "[/]search [r]efresh [o]pen [l]ater [Tab]read later [q]uit",
            ),
            View::ReadLater => Cow::Borrowed("[o]pen [d]elete [Tab]feed [q]uit"),
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
