use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::app::backend::MockResourceClient;
use crate::app::constants::OVERLAY_CLOSE_TICKS;
use crate::app::message::{Effect, Message};
use crate::app::registry::MockFactory;
use crate::model::ConnectionConfig;

pub(crate) fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

/// Drives an [`App`] the way the event loop does, but runs every effect on
/// the calling thread and feeds results back in FIFO order. Every effect
/// and message is recorded. Probe delays are recorded and then skipped.
pub(crate) struct Harness {
    pub(crate) app: App,
    pub(crate) effects: Vec<Effect>,
    pub(crate) messages: Vec<Message>,
    pub(crate) probe_delays: Vec<Duration>,
    pub(crate) now: Instant,
}

impl Harness {
    pub(crate) fn new(mut app: App) -> Self {
        let now = Instant::now();
        app.health.last_poll = Some(now);
        Self {
            app,
            effects: vec![],
            messages: vec![],
            probe_delays: vec![],
            now,
        }
    }

    pub(crate) fn with_factory(factory: MockFactory, connections: Vec<ConnectionConfig>) -> Self {
        Self::new(App::for_test_with(factory, connections, std::env::temp_dir()))
    }

    pub(crate) fn with_connections(
        client: Arc<MockResourceClient>,
        connections: Vec<ConnectionConfig>,
    ) -> Self {
        Self::with_factory(MockFactory::shared(client), connections)
    }

    pub(crate) fn start(&mut self) {
        let effects = self.app.startup(self.now);
        self.run(effects);
    }

    pub(crate) fn send(&mut self, message: Message) {
        self.drain(VecDeque::from([message]));
    }

    pub(crate) fn run(&mut self, effects: Vec<Effect>) {
        let queue = effects
            .into_iter()
            .map(|effect| self.execute(effect))
            .collect();
        self.drain(queue);
    }

    pub(crate) fn press(&mut self, code: KeyCode) {
        self.send(Message::Key(key(code)));
    }

    pub(crate) fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.press(KeyCode::Char(ch));
        }
    }

    /// Ticks until a closing overlay is gone and its pending command ran.
    pub(crate) fn close_overlay(&mut self) {
        for _ in 0..OVERLAY_CLOSE_TICKS {
            self.send(Message::Tick(self.now));
        }
    }

    pub(crate) fn advance(&mut self, by: Duration) {
        self.now += by;
        self.send(Message::Tick(self.now));
    }

    pub(crate) fn refresh(&mut self, manual: bool) {
        let effects = self.app.refresh_statuses(manual, self.now);
        self.run(effects);
    }

    fn execute(&mut self, effect: Effect) -> Message {
        self.effects.push(effect.clone());
        let effect = match effect {
            Effect::Probe {
                round,
                connection_id,
                delay,
            } => {
                self.probe_delays.push(delay);
                Effect::Probe {
                    round,
                    connection_id,
                    delay: Duration::ZERO,
                }
            }
            other => other,
        };
        effect.into_job(&self.app.registry).run()
    }

    fn drain(&mut self, mut queue: VecDeque<Message>) {
        while let Some(message) = queue.pop_front() {
            self.messages.push(message.clone());
            let effects = self.app.update(message);
            for effect in effects {
                let result = self.execute(effect);
                queue.push_back(result);
            }
        }
    }
}
