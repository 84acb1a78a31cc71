use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Sparkline, Table, TableState};

use crate::app::App;
use crate::model::format_epoch;
use crate::ui::constants::{ACTIVITY_HEIGHT, HEALTH_COMMANDS, SPARKLINE_HEIGHT};
use crate::ui::helpers::truncate_text;

pub(crate) fn draw_health_screen(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(SPARKLINE_HEIGHT),
            Constraint::Length(ACTIVITY_HEIGHT),
            Constraint::Length(1),
        ])
        .split(area);
    draw_status_table(frame, app, layout[0]);
    draw_latency_history(frame, app, layout[1]);
    draw_activity(frame, app, layout[2]);
    frame.render_widget(
        Paragraph::new(HEALTH_COMMANDS)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center),
        layout[3],
    );
}

fn draw_status_table(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let header_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let title = if app.health.loading {
        "Server health (checking...)"
    } else {
        "Server health"
    };
    let configs = app.registry.configs();
    let rows: Vec<Row> = configs
        .iter()
        .map(|config| {
            let status = app.health.statuses.get(&config.id);
            let (state, style) = match status {
                Some(status) if status.online => ("online", Style::default().fg(Color::Green)),
                Some(_) => ("offline", Style::default().fg(Color::Red)),
                None => ("unknown", Style::default().fg(Color::DarkGray)),
            };
            let version = status
                .and_then(|status| status.version.clone())
                .unwrap_or_else(|| "-".to_string());
            let latency = status
                .and_then(|status| status.latency_ms)
                .map(|ms| format!("{ms} ms"))
                .unwrap_or_else(|| "-".to_string());
            let checked = status
                .map(|status| format_epoch(status.checked_at))
                .unwrap_or_else(|| "-".to_string());
            let detail = status
                .and_then(|status| status.error.clone())
                .unwrap_or_default();
            Row::new(vec![
                Cell::from(config.label()),
                Cell::from(Span::styled(state, style)),
                Cell::from(version),
                Cell::from(latency),
                Cell::from(checked),
                Cell::from(Span::styled(detail, Style::default().fg(Color::Red))),
            ])
        })
        .collect();
    let widths = [
        Constraint::Percentage(22),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(19),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Server", "Status", "Version", "Latency", "Checked", "Error"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .title(Line::from(Span::styled(title, header_style)))
                .borders(Borders::ALL),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol(">");
    let mut state = TableState::default();
    if !configs.is_empty() {
        state.select(Some(app.health.cursor.min(configs.len() - 1)));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_latency_history(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let configs = app.registry.configs();
    let selected = configs.get(app.health.cursor.min(configs.len().saturating_sub(1)));
    let history = selected.and_then(|config| app.health.histories.get(&config.id));
    let samples: Vec<u64> = history
        .map(|history| history.samples().collect())
        .unwrap_or_default();
    let title = match (selected, history.and_then(|history| history.last())) {
        (Some(config), Some(last)) => format!("Latency {} (last {last} ms)", config.label()),
        (Some(config), None) => format!("Latency {} (no samples)", config.label()),
        (None, _) => "Latency".to_string(),
    };
    let sparkline = Sparkline::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .data(&samples)
        .style(Style::default().fg(Color::Green));
    frame.render_widget(sparkline, area);
}

fn draw_activity(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .log
        .recent(area.height.saturating_sub(2) as usize)
        .map(|line| Line::from(truncate_text(line, width)))
        .collect();
    let activity = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled("Activity", Style::default().fg(Color::Gray)))
            .borders(Borders::ALL),
    );
    frame.render_widget(activity, area);
}
