use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, ListState, Paragraph};

use crate::ui::constants::{POPUP_MIN_HEIGHT, POPUP_MIN_WIDTH};

pub(crate) fn field_line(
    label: &str,
    value: &str,
    active: bool,
    label_width: usize,
    max_value_width: usize,
) -> Line<'static> {
    let display = truncate_text(value, max_value_width);
    let indicator = if active { "> " } else { "  " };
    let indicator_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let value_style = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(indicator, indicator_style),
        Span::styled(
            format!("{label:<label_width$}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(display, value_style),
    ])
}

/// Bold key names interleaved with plain descriptions.
pub(crate) fn key_hint_line(pairs: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(pairs.len() * 3);
    for (idx, (key, action)) in pairs.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw(", "));
        }
        spans.push(Span::styled(
            key.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {action}")));
    }
    Line::from(spans).style(Style::default().fg(Color::Gray))
}

pub(crate) fn truncate_text(value: &str, max_width: usize) -> String {
    if value.chars().count() <= max_width {
        return value.to_string();
    }
    match max_width {
        0..=3 => value.chars().take(max_width).collect(),
        _ => value.chars().take(max_width - 3).chain("...".chars()).collect(),
    }
}

pub(crate) fn centered_rect_abs(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.max(POPUP_MIN_WIDTH).min(area.width);
    let height = height.max(POPUP_MIN_HEIGHT).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Rows a popup needs around its content: two borders and the title rule.
pub(crate) fn modal_height(content_lines: usize, footer_lines: usize) -> u16 {
    u16::try_from(content_lines + footer_lines)
        .unwrap_or(u16::MAX)
        .saturating_add(3)
}

/// Clears `area`, draws a bordered popup titled `title` with a rule under
/// the border, and returns the space left for content.
pub(crate) fn draw_popup_frame(frame: &mut Frame<'_>, area: Rect, title: &str, style: Style) -> Rect {
    frame.render_widget(Clear, area);
    let heading = Span::styled(format!(" {title} "), style.add_modifier(Modifier::BOLD));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(Line::from(heading).centered());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 {
        return inner;
    }
    let [rule, content] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);
    frame.render_widget(
        Paragraph::new("-".repeat(rule.width as usize)).style(style),
        rule,
    );
    content
}

pub(crate) fn list_state(selected: usize, len: usize) -> ListState {
    let mut state = ListState::default();
    if len == 0 {
        state.select(None);
    } else {
        state.select(Some(selected.min(len.saturating_sub(1))));
    }
    state
}

#[cfg(test)]
pub(crate) fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    buffer.content().iter().map(|cell| cell.symbol()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_text_handles_edges() {
        assert_eq!(truncate_text("abc", 0), "");
        assert_eq!(truncate_text("abc", 2), "ab");
        assert_eq!(truncate_text("abcd", 3), "abc");
        assert_eq!(truncate_text("abcdef", 4), "a...");
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("", 0), "");
    }

    #[test]
    fn list_state_clamps_selection() {
        let state = list_state(5, 0);
        assert!(state.selected().is_none());
        let state = list_state(5, 3);
        assert_eq!(state.selected(), Some(2));
    }

    #[test]
    fn centered_rect_abs_clamps_to_area() {
        let area = Rect {
            x: 0,
            y: 0,
            width: 10,
            height: 5,
        };
        let rect = centered_rect_abs(100, 100, area);
        assert_eq!(rect.width, 10);
        assert_eq!(rect.height, 5);
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 0);
    }

    #[test]
    fn key_hint_line_joins_pairs() {
        let line = key_hint_line(&[("Enter", "save"), ("Esc", "cancel")]);
        let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, "Enter save, Esc cancel");
    }
}
