use crate::api::ArticleSource;
use crate::app::App;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::articles::article_item;

/// Render the saved-articles view
pub fn render<S: ArticleSource>(f: &mut Frame, app: &App<S>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Read Later ({}) ", app.read_later.len()));

    if app.read_later.is_empty() {
        let paragraph = Paragraph::new("Nothing saved yet. Press [l] on an article to save it.")
            .block(block)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(paragraph, area);
        return;
    }

    let width = area.width as usize;
    let items: Vec<ListItem> = app
        .read_later
        .iter()
        .enumerate()
        .map(|(i, saved)| article_item(&saved.article, width, i == app.read_later_selected))
        .collect();

    let mut state = ListState::default().with_selected(Some(app.read_later_selected));
    f.render_stateful_widget(List::new(items).block(block), area, &mut state);
}
