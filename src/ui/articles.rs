use crate::api::{Article, ArticleSource};
use crate::app::App;
use crate::util::truncate_to_width;
use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Format timestamp as relative time
pub fn format_relative_time(timestamp: Option<i64>) -> String {
    let Some(ts) = timestamp else {
        return String::new();
    };

    let diff = Utc::now().timestamp() - ts;

    if diff < 0 {
        return "now".to_string();
    }
    if diff < 3600 {
        return format!("{}m", diff / 60);
    }
    if diff < 86400 {
        return format!("{}h", diff / 3600);
    }
    if diff < 604800 {
        return format!("{}d", diff / 86400);
    }

    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// One list row: title, then author, tags, likes and age.
pub(super) fn article_item(article: &Article, width: usize, selected: bool) -> ListItem<'static> {
    let title_style = if selected {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let title = truncate_to_width(&article.title, width.saturating_sub(2)).into_owned();

    let mut meta = format!("@{}  ♥ {}", article.author, article.likes_count);
    let age = format_relative_time(article.created_at);
    if !age.is_empty() {
        meta.push_str("  ");
        meta.push_str(&age);
    }
    if !article.tags.is_empty() {
        meta.push_str("  #");
        meta.push_str(&article.tags.join(" #"));
    }
    let meta = truncate_to_width(&meta, width.saturating_sub(2)).into_owned();

    ListItem::new(vec![
        Line::from(Span::styled(title, title_style)),
        Line::from(Span::styled(meta, Style::default().fg(Color::Gray))),
    ])
}

/// Render the feed view
pub fn render<S: ArticleSource>(f: &mut Frame, app: &App<S>, area: Rect) {
    let title = match app.feed.active_query() {
        Some(query) => format!(" Qiita - {query} "),
        None => " Qiita ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let placeholder = if app.feed.show_empty() {
        Some("No articles found")
    } else if !app.feed.is_list_visible() {
        Some(if app.feed.is_loading() { "Loading..." } else { "" })
    } else {
        None
    };

    if let Some(text) = placeholder {
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(paragraph, area);
        return;
    }

    let width = area.width as usize;
    let selected = app.feed.selected();
    let items: Vec<ListItem> = app
        .feed
        .articles()
        .iter()
        .enumerate()
        .map(|(i, article)| article_item(article, width, i == selected))
        .collect();

    let mut state = ListState::default().with_selected(Some(selected));
    f.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_time_none() {
        assert_eq!(format_relative_time(None), "");
    }

    #[test]
    fn test_relative_time_future_is_now() {
        let future = Utc::now().timestamp() + 600;
        assert_eq!(format_relative_time(Some(future)), "now");
    }

    #[test]
    fn test_relative_time_units() {
        let now = Utc::now().timestamp();
        assert_eq!(format_relative_time(Some(now - 120)), "2m");
        assert_eq!(format_relative_time(Some(now - 3 * 3600)), "3h");
        assert_eq!(format_relative_time(Some(now - 2 * 86400)), "2d");
    }

    #[test]
    fn test_relative_time_old_shows_date() {
        assert_eq!(format_relative_time(Some(1_577_836_800)), "2020-01-01");
    }
}
