use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use crate::app::tree::TreeRow;
use crate::app::{App, Panel, Screen};
use crate::model::{NodeKind, UploadFormat};
use crate::ui::constants::{HELP_TEXT, LOCAL_COMMANDS, REMOTE_COMMANDS};
use crate::ui::helpers::{list_state, truncate_text};

fn panel_block(title: String, focused: bool) -> Block<'static> {
    let header_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .title(Line::from(Span::styled(title, header_style)))
        .borders(Borders::ALL)
        .border_style(border_style)
}

fn highlight_list(items: Vec<ListItem<'static>>) -> List<'static> {
    List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
        .highlight_symbol(Span::styled(
            ">",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
}

/// Splits `inner` into a list area and a one-line command footer.
fn split_footer(inner: Rect) -> (Rect, Rect) {
    let list = Rect {
        height: inner.height.saturating_sub(1),
        ..inner
    };
    let footer = Rect {
        y: inner.y + inner.height.saturating_sub(1),
        height: inner.height.min(1),
        ..inner
    };
    (list, footer)
}

fn commands_line(text: &'static str) -> Paragraph<'static> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
}

pub(crate) fn draw_app_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let screen = match app.screen {
        Screen::Browser => "browser",
        Screen::Health => "health",
    };
    let mut spans = vec![
        Span::styled(
            format!("GEO DECK {}", env!("CARGO_PKG_VERSION")),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  [{screen}]  ")),
        Span::styled(HELP_TEXT, Style::default().fg(Color::Gray)),
    ];
    if let Some(activity) = app.crud.activity() {
        spans.push(Span::styled(
            format!("  {activity}..."),
            Style::default().fg(Color::Yellow),
        ));
    }
    if app.health.loading {
        spans.push(Span::styled(
            "  checking servers...",
            Style::default().fg(Color::Yellow),
        ));
    }
    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(header, area);
}

fn tree_row_item(app: &App, row: &TreeRow, width: usize) -> ListItem<'static> {
    let indent = "  ".repeat(row.depth);
    let marker = match (row.expandable, row.expanded) {
        (false, _) => "  ",
        (true, true) => "v ",
        (true, false) => "+ ",
    };
    let base = match row.kind {
        NodeKind::Connection => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        NodeKind::Workspace => Style::default().fg(Color::Yellow),
        NodeKind::Category(_) => Style::default().fg(Color::Gray),
        NodeKind::Resource(_) if row.enabled == Some(false) => Style::default().fg(Color::DarkGray),
        NodeKind::Resource(_) => Style::default(),
    };
    let mut spans = Vec::new();
    if row.kind == NodeKind::Connection {
        let node = app.tree.find(row.id);
        let status = node.and_then(|node| app.health.statuses.get(&node.connection_id));
        let (dot, style) = match status {
            Some(status) if status.online => ("* ", Style::default().fg(Color::Green)),
            Some(_) => ("* ", Style::default().fg(Color::Red)),
            None => ("  ", Style::default()),
        };
        spans.push(Span::styled(dot, style));
    }
    let name = truncate_text(&row.name, width.saturating_sub(indent.len() + 4));
    spans.push(Span::raw(format!("{indent}{marker}")));
    spans.push(Span::styled(name, base));
    if row.enabled == Some(false) {
        spans.push(Span::styled(" (disabled)", Style::default().fg(Color::DarkGray)));
    }
    if row.loading {
        spans.push(Span::styled(" loading...", Style::default().fg(Color::Yellow)));
    }
    if let Some(err) = &row.error {
        spans.push(Span::styled(
            format!(" ! {err}"),
            Style::default().fg(Color::Red),
        ));
    }
    ListItem::new(Line::from(spans))
}

pub(crate) fn draw_remote_panel(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = panel_block("GeoServer".to_string(), app.panel == Panel::Remote);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let (list_area, footer_area) = split_footer(inner);

    let rows = app.tree.rows();
    let width = list_area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = if rows.is_empty() {
        vec![ListItem::new("No connections, press (a) to add one")]
    } else {
        rows.iter().map(|row| tree_row_item(app, row, width)).collect()
    };
    let mut state = list_state(app.tree.cursor(), rows.len());
    frame.render_stateful_widget(highlight_list(items), list_area, &mut state);
    frame.render_widget(commands_line(REMOTE_COMMANDS), footer_area);
}

pub(crate) fn draw_local_panel(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let width = area.width.saturating_sub(4) as usize;
    let title = truncate_text(&app.browser.cwd.to_string_lossy(), width);
    let block = panel_block(title, app.panel == Panel::Local);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let (list_area, footer_area) = split_footer(inner);

    let items: Vec<ListItem> = if let Some(err) = &app.browser.error {
        vec![ListItem::new(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )))]
    } else if app.browser.entries.is_empty() {
        vec![ListItem::new("Empty directory")]
    } else {
        app.browser
            .entries
            .iter()
            .map(|entry| {
                let mark = if app.browser.marked.contains(&entry.path) {
                    "[x] "
                } else {
                    "    "
                };
                let (name, style) = if entry.is_dir {
                    (
                        format!("{}/", entry.name),
                        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
                    )
                } else if UploadFormat::from_path(&entry.path).is_some() {
                    (entry.name.clone(), Style::default().fg(Color::Green))
                } else {
                    (entry.name.clone(), Style::default())
                };
                ListItem::new(Line::from(vec![
                    Span::raw(mark),
                    Span::styled(truncate_text(&name, width.saturating_sub(5)), style),
                ]))
            })
            .collect()
    };
    let len = if app.browser.error.is_some() {
        0
    } else {
        app.browser.entries.len()
    };
    let mut state = list_state(app.browser.cursor, len);
    frame.render_stateful_widget(highlight_list(items), list_area, &mut state);
    frame.render_widget(commands_line(LOCAL_COMMANDS), footer_area);
}

pub(crate) fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let width = area.width.saturating_sub(4) as usize;
    let status = Paragraph::new(Line::from(Span::styled(
        truncate_text(&app.status, width),
        Style::default().fg(Color::White),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled("Status", Style::default().fg(Color::Gray))),
    );
    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::backend::MockResourceClient;
    use crate::app::harness::Harness;
    use crate::model::ConnectionConfig;
    use crate::ui::helpers::buffer_text;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn remote_panel_renders_rows_and_health_marker() {
        let client = Arc::new(MockResourceClient::default());
        client.set_list("workspaces", "", &["topp"]);
        let mut harness = Harness::with_connections(
            client,
            vec![ConnectionConfig {
                id: "gs".to_string(),
                name: "prod".to_string(),
                url: "http://localhost:8080/geoserver".to_string(),
                user: "admin".to_string(),
                password: "geoserver".to_string(),
            }],
        );
        harness.start();
        assert!(harness.app.health.statuses["gs"].online);

        let backend = TestBackend::new(64, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| draw_remote_panel(frame, &harness.app, frame.area()))
            .unwrap();
        let content = buffer_text(terminal.backend().buffer());
        assert!(content.contains("* "));
        assert!(content.contains("prod"));
        assert!(content.contains("topp"));
        assert!(content.contains("(n)ew"));
    }

    #[test]
    fn empty_tree_shows_hint() {
        let app = App::for_test();
        let backend = TestBackend::new(64, 6);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| draw_remote_panel(frame, &app, frame.area()))
            .unwrap();
        assert!(buffer_text(terminal.backend().buffer()).contains("No connections"));
    }

    #[test]
    fn status_bar_shows_status() {
        let mut app = App::for_test();
        app.set_status("Created workspace parks");
        let backend = TestBackend::new(60, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| draw_status_bar(frame, &app, frame.area()))
            .unwrap();
        assert!(buffer_text(terminal.backend().buffer()).contains("Created workspace parks"));
    }
}
