use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::constants::OVERLAY_CLOSE_TICKS;
use crate::app::message::Effect;
use crate::app::tree::SearchHit;
use crate::app::wizard::Form;

/// Value handed to a confirm handler.
#[derive(Debug)]
pub(crate) enum OverlayOutput<'a> {
    Confirmed,
    Text(&'a str),
    Form(&'a Form),
    Selected(&'a SearchHit),
}

/// Runs when the user confirms. `Err` keeps the overlay open and shows the
/// message inline; `Ok(Some(effect))` becomes the pending command.
pub(crate) type ConfirmHandler = Box<dyn FnMut(OverlayOutput<'_>) -> Result<Option<Effect>, String>>;
pub(crate) type CancelHandler = Box<dyn FnOnce() -> Option<Effect>>;

pub(crate) enum OverlayKind {
    Confirm {
        title: String,
        message: String,
    },
    Input {
        title: String,
        prompt: String,
        value: String,
    },
    Wizard {
        title: String,
        form: Form,
    },
    Progress {
        title: String,
        lines: Vec<String>,
        current: usize,
        total: usize,
        done: bool,
    },
    Info {
        title: String,
        lines: Vec<String>,
        loading: bool,
    },
    Search {
        query: String,
        hits: Vec<SearchHit>,
        selected: usize,
    },
    Preview {
        title: String,
        lines: Vec<String>,
        loading: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OverlayPhase {
    Open,
    Closing(u8),
    Closed,
}

/// What the router did with a key.
#[derive(Debug)]
pub(crate) enum OverlayEvent {
    Consumed,
    QueryChanged,
    Closed(Option<Effect>),
}

pub(crate) struct Overlay {
    pub(crate) id: u64,
    pub(crate) kind: OverlayKind,
    pub(crate) phase: OverlayPhase,
    pub(crate) feedback: Option<String>,
    pub(crate) scroll: u16,
    on_confirm: Option<ConfirmHandler>,
    on_cancel: Option<CancelHandler>,
}

impl Overlay {
    pub(crate) fn new(kind: OverlayKind) -> Self {
        Self {
            id: 0,
            kind,
            phase: OverlayPhase::Open,
            feedback: None,
            scroll: 0,
            on_confirm: None,
            on_cancel: None,
        }
    }

    pub(crate) fn confirm(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(OverlayKind::Confirm {
            title: title.into(),
            message: message.into(),
        })
    }

    pub(crate) fn input(
        title: impl Into<String>,
        prompt: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(OverlayKind::Input {
            title: title.into(),
            prompt: prompt.into(),
            value: value.into(),
        })
    }

    pub(crate) fn wizard(title: impl Into<String>, form: Form) -> Self {
        Self::new(OverlayKind::Wizard {
            title: title.into(),
            form,
        })
    }

    pub(crate) fn progress(title: impl Into<String>, total: usize) -> Self {
        Self::new(OverlayKind::Progress {
            title: title.into(),
            lines: vec![],
            current: 0,
            total,
            done: false,
        })
    }

    pub(crate) fn info(title: impl Into<String>, lines: Vec<String>, loading: bool) -> Self {
        Self::new(OverlayKind::Info {
            title: title.into(),
            lines,
            loading,
        })
    }

    pub(crate) fn search() -> Self {
        Self::new(OverlayKind::Search {
            query: String::new(),
            hits: vec![],
            selected: 0,
        })
    }

    pub(crate) fn preview(title: impl Into<String>) -> Self {
        Self::new(OverlayKind::Preview {
            title: title.into(),
            lines: vec![],
            loading: true,
        })
    }

    pub(crate) fn on_confirm(
        mut self,
        handler: impl FnMut(OverlayOutput<'_>) -> Result<Option<Effect>, String> + 'static,
    ) -> Self {
        self.on_confirm = Some(Box::new(handler));
        self
    }

    pub(crate) fn on_cancel(mut self, handler: impl FnOnce() -> Option<Effect> + 'static) -> Self {
        self.on_cancel = Some(Box::new(handler));
        self
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.phase != OverlayPhase::Closed
    }

    pub(crate) fn is_open(&self) -> bool {
        self.phase == OverlayPhase::Open
    }

    /// Advances the close animation by one frame.
    pub(crate) fn tick(&mut self) {
        if let OverlayPhase::Closing(remaining) = self.phase {
            self.phase = if remaining <= 1 {
                OverlayPhase::Closed
            } else {
                OverlayPhase::Closing(remaining - 1)
            };
        }
    }

    fn begin_close(&mut self) {
        self.phase = OverlayPhase::Closing(OVERLAY_CLOSE_TICKS);
    }

    fn confirm_with(&mut self, output: OverlayOutput<'_>) -> OverlayEvent {
        let result = match self.on_confirm.as_mut() {
            Some(handler) => handler(output),
            None => Ok(None),
        };
        match result {
            Ok(effect) => {
                self.on_cancel = None;
                self.feedback = None;
                self.begin_close();
                OverlayEvent::Closed(effect)
            }
            Err(feedback) => {
                self.feedback = Some(feedback);
                OverlayEvent::Consumed
            }
        }
    }

    pub(crate) fn cancel(&mut self) -> OverlayEvent {
        let effect = self.on_cancel.take().and_then(|handler| handler());
        self.on_confirm = None;
        self.begin_close();
        OverlayEvent::Closed(effect)
    }

    /// Single input router for every overlay variant. Closing overlays
    /// swallow input.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> OverlayEvent {
        if !self.is_open() {
            return OverlayEvent::Consumed;
        }
        match &mut self.kind {
            OverlayKind::Confirm { .. } => match key.code {
                KeyCode::Enter | KeyCode::Char('y') => self.confirm_with(OverlayOutput::Confirmed),
                KeyCode::Esc | KeyCode::Char('n') => self.cancel(),
                _ => OverlayEvent::Consumed,
            },
            OverlayKind::Input { value, .. } => match key.code {
                KeyCode::Enter => {
                    let text = value.trim().to_string();
                    self.confirm_with(OverlayOutput::Text(&text))
                }
                KeyCode::Esc => self.cancel(),
                KeyCode::Backspace => {
                    value.pop();
                    OverlayEvent::Consumed
                }
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    value.push(ch);
                    OverlayEvent::Consumed
                }
                _ => OverlayEvent::Consumed,
            },
            OverlayKind::Wizard { form, .. } => match key.code {
                KeyCode::Enter => {
                    let snapshot = form.clone();
                    self.confirm_with(OverlayOutput::Form(&snapshot))
                }
                KeyCode::Esc => self.cancel(),
                _ => {
                    form.handle_key(key);
                    OverlayEvent::Consumed
                }
            },
            OverlayKind::Progress { done, .. } => {
                if *done && matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.cancel()
                } else {
                    OverlayEvent::Consumed
                }
            }
            OverlayKind::Info { .. } | OverlayKind::Preview { .. } => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => self.cancel(),
                KeyCode::Down | KeyCode::Char('j') => {
                    self.scroll = self.scroll.saturating_add(1);
                    OverlayEvent::Consumed
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.scroll = self.scroll.saturating_sub(1);
                    OverlayEvent::Consumed
                }
                _ => OverlayEvent::Consumed,
            },
            OverlayKind::Search {
                query,
                hits,
                selected,
            } => match key.code {
                KeyCode::Esc => self.cancel(),
                KeyCode::Enter => match hits.get(*selected).cloned() {
                    Some(hit) => self.confirm_with(OverlayOutput::Selected(&hit)),
                    None => OverlayEvent::Consumed,
                },
                KeyCode::Down => {
                    if *selected + 1 < hits.len() {
                        *selected += 1;
                    }
                    OverlayEvent::Consumed
                }
                KeyCode::Up => {
                    *selected = selected.saturating_sub(1);
                    OverlayEvent::Consumed
                }
                KeyCode::Backspace => {
                    query.pop();
                    OverlayEvent::QueryChanged
                }
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    query.push(ch);
                    OverlayEvent::QueryChanged
                }
                _ => OverlayEvent::Consumed,
            },
        }
    }

    pub(crate) fn title(&self) -> &str {
        match &self.kind {
            OverlayKind::Confirm { title, .. }
            | OverlayKind::Input { title, .. }
            | OverlayKind::Wizard { title, .. }
            | OverlayKind::Progress { title, .. }
            | OverlayKind::Info { title, .. }
            | OverlayKind::Preview { title, .. } => title,
            OverlayKind::Search { .. } => "Search",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::app::message::Message;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn close(overlay: &mut Overlay) {
        for _ in 0..OVERLAY_CLOSE_TICKS {
            assert!(overlay.is_visible());
            overlay.tick();
        }
        assert!(!overlay.is_visible());
    }

    #[test]
    fn confirm_returns_effect_and_animates_closed() {
        let mut overlay = Overlay::confirm("Delete", "Really?")
            .on_confirm(|_| Ok(Some(Effect::Emit(Message::Reveal(vec![])))));
        let OverlayEvent::Closed(Some(Effect::Emit(_))) = overlay.handle_key(key(KeyCode::Enter))
        else {
            panic!("expected pending effect");
        };
        assert_eq!(overlay.phase, OverlayPhase::Closing(OVERLAY_CLOSE_TICKS));
        assert!(matches!(
            overlay.handle_key(key(KeyCode::Esc)),
            OverlayEvent::Consumed
        ));
        close(&mut overlay);
    }

    #[test]
    fn validation_error_keeps_input_open() {
        let mut overlay = Overlay::input("Download", "File name", "").on_confirm(|output| {
            match output {
                OverlayOutput::Text(text) if !text.is_empty() => Ok(None),
                _ => Err("File name is required".to_string()),
            }
        });
        assert!(matches!(
            overlay.handle_key(key(KeyCode::Enter)),
            OverlayEvent::Consumed
        ));
        assert!(overlay.is_open());
        assert_eq!(overlay.feedback.as_deref(), Some("File name is required"));
        overlay.handle_key(key(KeyCode::Char('a')));
        assert!(matches!(
            overlay.handle_key(key(KeyCode::Enter)),
            OverlayEvent::Closed(None)
        ));
    }

    #[test]
    fn cancel_runs_cancel_handler_once() {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let mut overlay = Overlay::confirm("Delete", "Really?").on_cancel(move || {
            seen.set(seen.get() + 1);
            None
        });
        overlay.handle_key(key(KeyCode::Esc));
        overlay.handle_key(key(KeyCode::Esc));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn progress_only_closes_when_done() {
        let mut overlay = Overlay::progress("Upload", 2);
        assert!(matches!(
            overlay.handle_key(key(KeyCode::Esc)),
            OverlayEvent::Consumed
        ));
        if let OverlayKind::Progress { done, .. } = &mut overlay.kind {
            *done = true;
        }
        assert!(matches!(
            overlay.handle_key(key(KeyCode::Esc)),
            OverlayEvent::Closed(None)
        ));
    }

    #[test]
    fn search_reports_query_changes() {
        let mut overlay = Overlay::search();
        assert!(matches!(
            overlay.handle_key(key(KeyCode::Char('r'))),
            OverlayEvent::QueryChanged
        ));
        assert!(matches!(
            overlay.handle_key(key(KeyCode::Enter)),
            OverlayEvent::Consumed
        ));
        let OverlayKind::Search { query, .. } = &overlay.kind else {
            panic!("expected search");
        };
        assert_eq!(query, "r");
    }
}
