use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

mod app;
mod geoserver;
mod model;
mod storage;
mod ui;

use app::App;
use app::effects::dispatch;
use app::message::Message;

const TICK_RATE: Duration = Duration::from_millis(33);

fn main() -> Result<()> {
    let mut app = App::load_with_master()?;

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    let saved = app.shutdown();
    result.and(saved)
}

/// Single-threaded event loop: one message at a time, effects dispatched to
/// worker threads that report back over `rx`.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let (tx, rx): (Sender<Message>, Receiver<Message>) = mpsc::channel();
    dispatch(app.startup(Instant::now()), &app.registry, &tx);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| ui::draw_ui(frame, app))?;

        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(key.code, KeyCode::Char('c'));
                if ctrl_c {
                    return Ok(());
                }
                if key.kind == KeyEventKind::Press {
                    let effects = app.update(Message::Key(key));
                    dispatch(effects, &app.registry, &tx);
                }
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            last_tick = Instant::now();
            let effects = app.update(Message::Tick(last_tick));
            dispatch(effects, &app.registry, &tx);
        }

        while let Ok(message) = rx.try_recv() {
            let effects = app.update(message);
            dispatch(effects, &app.registry, &tx);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
