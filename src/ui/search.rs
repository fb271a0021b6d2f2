//! Search overlay: tag input, sort and period selectors, history list.

use crate::app::{SearchField, SearchOverlay};
use crate::feed::{SearchPeriod, SearchSort};
use crate::util::display_width;
use ratatui::{
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::render::centered_rect;

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// Selector row: every choice, the active one highlighted.
fn choices<'a>(label: &'a str, labels: Vec<(&'a str, bool)>, focused: bool) -> Line<'a> {
    let mut spans = vec![Span::styled(format!("{label:<8}"), field_style(focused))];
    for (text, active) in labels {
        let style = if active {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {text} "), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

pub(super) fn render(f: &mut Frame, overlay: &SearchOverlay) {
    let history_rows = overlay.history.len().clamp(1, 8) as u16;
    let area = centered_rect(f.area(), 60, 9 + history_rows);
    if area.width < 20 || area.height < 8 {
        return;
    }

    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Search by tag ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

    let tag_focused = overlay.focus == SearchField::Tag;
    let input = Paragraph::new(overlay.input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(field_style(tag_focused))
            .title(" Tag (empty = all) "),
    );
    f.render_widget(input, rows[0]);
    if tag_focused {
        let x = rows[0].x + 1 + display_width(&overlay.input) as u16;
        let max_x = rows[0].x + rows[0].width.saturating_sub(2);
        f.set_cursor_position(Position::new(x.min(max_x), rows[0].y + 1));
    }

    let sorts = SearchSort::ALL
        .iter()
        .map(|s| (s.label(), *s == overlay.sort))
        .collect();
    f.render_widget(
        Paragraph::new(choices("Sort", sorts, overlay.focus == SearchField::Sort)),
        rows[1],
    );

    let periods = SearchPeriod::ALL
        .iter()
        .map(|p| (p.label(), *p == overlay.period))
        .collect();
    f.render_widget(
        Paragraph::new(choices("Period", periods, overlay.focus == SearchField::Period)),
        rows[2],
    );

    let history_focused = overlay.focus == SearchField::History;
    let history_block = Block::default()
        .borders(Borders::TOP)
        .border_style(field_style(history_focused))
        .title(" History ");
    if overlay.history.is_empty() {
        f.render_widget(
            Paragraph::new("No searches yet")
                .style(Style::default().fg(Color::DarkGray))
                .block(history_block),
            rows[3],
        );
        return;
    }

    let items: Vec<ListItem> = overlay
        .history
        .iter()
        .map(|tag| ListItem::new(tag.as_str()))
        .collect();
    let highlight = if history_focused {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default()
    };
    let mut state = ListState::default().with_selected(Some(overlay.history_selected));
    f.render_stateful_widget(
        List::new(items)
            .block(history_block)
            .highlight_style(highlight),
        rows[3],
        &mut state,
    );
}
