use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::{App, Screen};
use crate::ui::constants::{HEADER_HEIGHT, STATUS_HEIGHT, browser_columns};
use crate::ui::health::draw_health_screen;
use crate::ui::modals::draw_overlay;
use crate::ui::panels::{draw_app_header, draw_local_panel, draw_remote_panel, draw_status_bar};

pub(crate) mod constants;
mod health;
mod helpers;
mod modals;
mod panels;

/// Renders one frame: header, the active screen, the status line and the
/// overlay on top of everything.
pub(crate) fn draw_ui(frame: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    draw_app_header(frame, app, layout[0]);
    match app.screen {
        Screen::Browser => {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(browser_columns())
                .split(layout[1]);
            draw_local_panel(frame, app, body[0]);
            draw_remote_panel(frame, app, body[1]);
        }
        Screen::Health => draw_health_screen(frame, app, layout[1]),
    }
    draw_status_bar(frame, app, layout[2]);

    if let Some(overlay) = &app.overlay {
        draw_overlay(frame, overlay);
    }
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::app::overlay::Overlay;
    use crate::ui::helpers::buffer_text;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw_ui(frame, app)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn browser_screen_draws_both_panels() {
        let app = App::for_test();
        let content = render(&app);
        assert!(content.contains("GEO DECK"));
        assert!(content.contains("GeoServer"));
        assert!(content.contains("(u)pload"));
        assert!(content.contains("Ready"));
    }

    #[test]
    fn health_screen_replaces_browser() {
        let mut app = App::for_test();
        app.screen = Screen::Health;
        let content = render(&app);
        assert!(content.contains("Server health"));
        assert!(!content.contains("(u)pload"));
    }

    #[test]
    fn overlay_is_drawn_on_top() {
        let mut app = App::for_test();
        app.open_overlay(Overlay::confirm("Remove connection", "Remove connection prod?"));
        assert!(render(&app).contains("Remove connection prod?"));
    }
}
