use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Gauge, List, ListItem, Paragraph, Wrap};

use crate::app::constants::OVERLAY_CLOSE_TICKS;
use crate::app::overlay::{Overlay, OverlayKind, OverlayPhase};
use crate::app::wizard::{FieldValue, Form};
use crate::ui::constants::{LABEL_WIDTH, MODAL_MAX_HEIGHT_PERCENT, MODAL_MIN_WIDTH, MODAL_WIDTH_PERCENT};
use crate::ui::helpers::{
    centered_rect_abs, draw_popup_frame, field_line, key_hint_line, list_state, modal_height,
    truncate_text,
};

/// Body height wanted by each overlay variant, before clamping.
fn content_lines(overlay: &Overlay) -> usize {
    match &overlay.kind {
        OverlayKind::Confirm { message, .. } => message.lines().count().max(1),
        OverlayKind::Input { .. } => 2,
        OverlayKind::Wizard { form, .. } => form.fields.len(),
        OverlayKind::Progress { lines, .. } => lines.len() + 2,
        OverlayKind::Info { .. } | OverlayKind::Preview { .. } | OverlayKind::Search { .. } => {
            usize::MAX / 2
        }
    }
}

fn footer(overlay: &Overlay) -> Line<'static> {
    let pairs: &[(&str, &str)] = match &overlay.kind {
        OverlayKind::Confirm { .. } => &[("Enter/y", "confirm"), ("Esc/n", "cancel")],
        OverlayKind::Input { .. } => &[("Enter", "accept"), ("Esc", "cancel")],
        OverlayKind::Wizard { .. } => &[
            ("Tab/Up/Down", "move"),
            ("Space", "toggle"),
            ("Enter", "save"),
            ("Esc", "cancel"),
        ],
        OverlayKind::Progress { done: true, .. } => &[("Enter", "close")],
        OverlayKind::Progress { .. } => &[("...", "working")],
        OverlayKind::Info { .. } | OverlayKind::Preview { .. } => {
            &[("Up/Down", "scroll"), ("Esc", "close")]
        }
        OverlayKind::Search { .. } => &[("Up/Down", "select"), ("Enter", "reveal"), ("Esc", "close")],
    };
    key_hint_line(pairs)
}

/// Area for the overlay; shrinks while the close animation runs.
fn overlay_area(frame_area: Rect, overlay: &Overlay) -> Rect {
    let width = (frame_area.width.saturating_mul(MODAL_WIDTH_PERCENT) / 100)
        .min(frame_area.width.saturating_sub(2))
        .max(MODAL_MIN_WIDTH);
    let max_height = frame_area.height.saturating_mul(MODAL_MAX_HEIGHT_PERCENT) / 100;
    let feedback = usize::from(overlay.feedback.is_some());
    let wanted = content_lines(overlay).min(u16::MAX as usize / 2);
    let mut height = modal_height(wanted + feedback + 1, 1).min(max_height);
    if let OverlayPhase::Closing(remaining) = overlay.phase {
        height = height * u16::from(remaining) / u16::from(OVERLAY_CLOSE_TICKS + 1);
    }
    centered_rect_abs(width, height, frame_area)
}

pub(crate) fn draw_overlay(frame: &mut Frame<'_>, overlay: &Overlay) {
    if !overlay.is_visible() {
        return;
    }
    let style = if overlay.is_open() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let area = overlay_area(frame.area(), overlay);
    let inner = draw_popup_frame(frame, area, overlay.title(), style);
    if inner.height == 0 {
        return;
    }

    let reserved = 1 + u16::from(overlay.feedback.is_some());
    let body = Rect {
        height: inner.height.saturating_sub(reserved),
        ..inner
    };
    match &overlay.kind {
        OverlayKind::Confirm { message, .. } => {
            frame.render_widget(Paragraph::new(message.clone()).wrap(Wrap { trim: true }), body);
        }
        OverlayKind::Input { prompt, value, .. } => draw_input(frame, body, prompt, value),
        OverlayKind::Wizard { form, .. } => draw_form(frame, body, form),
        OverlayKind::Progress {
            lines,
            current,
            total,
            done,
            ..
        } => draw_progress(frame, body, lines, *current, *total, *done),
        OverlayKind::Info { lines, loading, .. } | OverlayKind::Preview { lines, loading, .. } => {
            draw_scrollable(frame, body, lines, *loading, overlay.scroll);
        }
        OverlayKind::Search {
            query,
            hits,
            selected,
        } => {
            let prompt = Line::from(vec![
                Span::styled("/ ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(query.clone()),
            ]);
            frame.render_widget(Paragraph::new(prompt), Rect { height: 1, ..body });
            let list_area = Rect {
                y: body.y + 1,
                height: body.height.saturating_sub(1),
                ..body
            };
            let items: Vec<ListItem> = if hits.is_empty() && !query.is_empty() {
                vec![ListItem::new("No loaded node matches")]
            } else {
                hits.iter()
                    .map(|hit| ListItem::new(truncate_text(&hit.label, body.width as usize)))
                    .collect()
            };
            let list = List::new(items)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .highlight_symbol(">");
            let mut state = list_state(*selected, hits.len());
            frame.render_stateful_widget(list, list_area, &mut state);
            if overlay.is_open() {
                let x = body.x + 2 + query.chars().count() as u16;
                frame.set_cursor_position((x.min(body.x + body.width.saturating_sub(1)), body.y));
            }
        }
    }

    let mut y = inner.y + inner.height.saturating_sub(1);
    frame.render_widget(Paragraph::new(footer(overlay)), Rect { y, height: 1, ..inner });
    if let Some(feedback) = &overlay.feedback {
        y = y.saturating_sub(1);
        let line = Paragraph::new(Span::styled(
            truncate_text(feedback, inner.width as usize),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(line, Rect { y, height: 1, ..inner });
    }
}

fn draw_input(frame: &mut Frame<'_>, body: Rect, prompt: &str, value: &str) {
    let lines = vec![
        Line::from(prompt.to_string()),
        Line::from(vec![
            Span::styled("> ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(value.to_string(), Style::default().fg(Color::Yellow)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), body);
    if body.height >= 2 {
        let x = body.x + 2 + value.chars().count() as u16;
        frame.set_cursor_position((x.min(body.x + body.width.saturating_sub(1)), body.y + 1));
    }
}

fn draw_form(frame: &mut Frame<'_>, body: Rect, form: &Form) {
    let value_width = (body.width as usize).saturating_sub(2 + LABEL_WIDTH + 2);
    let visible = body.height as usize;
    let scroll = (form.focus + 1).saturating_sub(visible);
    let lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .skip(scroll)
        .take(visible)
        .map(|(idx, field)| {
            let label = if field.required {
                format!("{}*", field.label)
            } else {
                field.label.to_string()
            };
            let line = field_line(
                &label,
                &field.display_value(),
                idx == form.focus,
                LABEL_WIDTH,
                value_width,
            );
            if field.editable {
                line
            } else {
                line.style(Style::default().fg(Color::DarkGray))
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), body);

    if let Some(field) = form.fields.get(form.focus) {
        if let FieldValue::Text(_) = field.value {
            let row = form.focus - scroll;
            let col = field.display_value().chars().count().min(value_width);
            let x = body.x + (2 + LABEL_WIDTH + 2 + col) as u16;
            if (row as u16) < body.height {
                frame.set_cursor_position((x, body.y + row as u16));
            }
        }
    }
}

fn draw_progress(
    frame: &mut Frame<'_>,
    body: Rect,
    lines: &[String],
    current: usize,
    total: usize,
    done: bool,
) {
    let ratio = if total == 0 {
        1.0
    } else {
        (current as f64 / total as f64).clamp(0.0, 1.0)
    };
    let gauge_style = if done {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let gauge = Gauge::default()
        .gauge_style(gauge_style)
        .ratio(ratio)
        .label(format!("{current}/{total}"));
    frame.render_widget(gauge, Rect { height: body.height.min(1), ..body });

    let log_area = Rect {
        y: body.y + 2,
        height: body.height.saturating_sub(2),
        ..body
    };
    let skip = lines.len().saturating_sub(log_area.height as usize);
    let shown: Vec<Line> = lines
        .iter()
        .skip(skip)
        .map(|line| Line::from(truncate_text(line, body.width as usize)))
        .collect();
    frame.render_widget(Paragraph::new(shown), log_area);
}

fn draw_scrollable(frame: &mut Frame<'_>, body: Rect, lines: &[String], loading: bool, scroll: u16) {
    if loading {
        frame.render_widget(
            Paragraph::new(Span::styled("Loading...", Style::default().fg(Color::Yellow))),
            body,
        );
        return;
    }
    let text: Vec<Line> = lines.iter().map(|line| Line::from(line.clone())).collect();
    let max_scroll = (text.len() as u16).saturating_sub(body.height);
    frame.render_widget(Paragraph::new(text).scroll((scroll.min(max_scroll), 0)), body);
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::app::harness::key;
    use crate::app::wizard::connection_form;
    use crate::ui::helpers::buffer_text;

    fn render(overlay: &Overlay, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw_overlay(frame, overlay)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn confirm_renders_message_and_keys() {
        let overlay = Overlay::confirm("Delete", "Delete data store demo:roads?");
        let content = render(&overlay, 80, 20);
        assert!(content.contains("Delete data store demo:roads?"));
        assert!(content.contains("Enter/y"));
    }

    #[test]
    fn wizard_masks_secret_fields_and_shows_feedback() {
        let mut overlay = Overlay::wizard("New connection", connection_form(None));
        for _ in 0..3 {
            overlay.handle_key(key(KeyCode::Tab));
        }
        for ch in "hunter2".chars() {
            overlay.handle_key(key(KeyCode::Char(ch)));
        }
        overlay.feedback = Some("Name is required".to_string());
        let content = render(&overlay, 90, 24);
        assert!(content.contains("*******"));
        assert!(!content.contains("hunter2"));
        assert!(content.contains("Name is required"));
    }

    #[test]
    fn progress_shows_counts_and_lines() {
        let mut overlay = Overlay::progress("Upload", 2);
        if let OverlayKind::Progress { lines, current, .. } = &mut overlay.kind {
            lines.push("Uploading roads.zip".to_string());
            *current = 1;
        }
        let content = render(&overlay, 80, 20);
        assert!(content.contains("1/2"));
        assert!(content.contains("Uploading roads.zip"));
    }

    #[test]
    fn loading_info_shows_placeholder() {
        let overlay = Overlay::info("Server info", vec![], true);
        assert!(render(&overlay, 80, 20).contains("Loading..."));
    }

    #[test]
    fn closed_overlay_draws_nothing() {
        let mut overlay = Overlay::confirm("Gone", "never shown");
        overlay.cancel();
        for _ in 0..OVERLAY_CLOSE_TICKS {
            overlay.tick();
        }
        assert!(!render(&overlay, 60, 12).contains("never shown"));
    }
}
