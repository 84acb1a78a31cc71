use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::constants::{HELP_LINES, STATUS_NO_SELECTION};
use crate::app::crud::resource_ref;
use crate::app::message::{Effect, Message};
use crate::app::overlay::{Overlay, OverlayEvent, OverlayKind, OverlayOutput};
use crate::app::{App, Panel, Screen};
use crate::model::{Category, NodeKind};

impl App {
    /// Routes a key: the active overlay first, then the current screen,
    /// then the global bindings.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if let Some(overlay) = self.overlay.as_mut() {
            match overlay.handle_key(key) {
                OverlayEvent::Consumed => {}
                OverlayEvent::QueryChanged => self.refresh_search(),
                OverlayEvent::Closed(effect) => self.pending = effect,
            }
            return vec![];
        }
        let handled = match self.screen {
            Screen::Health => self.handle_health_key(key),
            Screen::Browser => match self.panel {
                Panel::Remote => self.handle_remote_key(key),
                Panel::Local => self.handle_local_key(key),
            },
        };
        match handled {
            Some(effects) => effects,
            None => self.handle_global_key(key),
        }
    }

    fn handle_global_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => {
                self.panel = match self.panel {
                    Panel::Local => Panel::Remote,
                    Panel::Remote => Panel::Local,
                };
            }
            KeyCode::Char('?') => {
                let lines = HELP_LINES.iter().map(|line| line.to_string()).collect();
                return self.open_overlay(Overlay::info("Help", lines, false)).1;
            }
            KeyCode::F(2) => {
                self.screen = match self.screen {
                    Screen::Browser => Screen::Health,
                    Screen::Health => Screen::Browser,
                };
            }
            _ => {}
        }
        vec![]
    }

    fn handle_remote_key(&mut self, key: KeyEvent) -> Option<Vec<Effect>> {
        let effects = match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.tree.move_cursor(-1);
                vec![]
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.tree.move_cursor(1);
                vec![]
            }
            KeyCode::Enter => self.toggle_selected(),
            KeyCode::Right | KeyCode::Char('l') => self.expand_selected(),
            KeyCode::Left | KeyCode::Char('h') => {
                self.collapse_or_parent();
                vec![]
            }
            KeyCode::Char('n') => self.begin_create(),
            KeyCode::Char('e') => self.begin_edit(),
            KeyCode::Char('x') => self.begin_delete(),
            KeyCode::Char('p') => self.open_preview(),
            KeyCode::Char('/') => self.open_search(),
            KeyCode::Char('r') => {
                self.set_status("Reloading resource tree");
                self.rebuild_tree()
            }
            KeyCode::Char('d') => self.open_download(),
            KeyCode::Char('i') => self.open_server_info(),
            KeyCode::Char('a') => self.open_connection_wizard(None),
            KeyCode::Char('E') => self.edit_selected_connection(),
            KeyCode::Char('X') => self.confirm_remove_connection(),
            _ => return None,
        };
        Some(effects)
    }

    fn handle_local_key(&mut self, key: KeyEvent) -> Option<Vec<Effect>> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.browser.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.browser.move_cursor(1),
            KeyCode::Enter => {
                self.browser.enter();
            }
            KeyCode::Backspace => {
                self.browser.parent();
            }
            KeyCode::Char(' ') => self.browser.toggle_mark(),
            KeyCode::Char('.') => self.browser.toggle_hidden(),
            KeyCode::Char('u') => return Some(self.request_upload()),
            KeyCode::Char('r') => {
                self.browser.refresh();
                self.set_status(format!("Refreshed {}", self.browser.cwd.display()));
            }
            _ => return None,
        }
        Some(vec![])
    }

    fn handle_health_key(&mut self, key: KeyEvent) -> Option<Vec<Effect>> {
        let count = self.registry.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.health.cursor = self.health.cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.health.cursor + 1 < count {
                    self.health.cursor += 1;
                }
            }
            KeyCode::Char('r') => return Some(self.refresh_statuses(true, Instant::now())),
            _ => return None,
        }
        Some(vec![])
    }

    fn toggle_selected(&mut self) -> Vec<Effect> {
        match self.tree.selected().map(|node| (node.id, node.expanded)) {
            Some((id, true)) => {
                self.tree.collapse(id);
                vec![]
            }
            Some(_) => self.expand_selected(),
            None => vec![],
        }
    }

    fn expand_selected(&mut self) -> Vec<Effect> {
        self.tree
            .selected_id()
            .and_then(|id| self.tree.expand(id))
            .map(Effect::LoadChildren)
            .into_iter()
            .collect()
    }

    fn collapse_or_parent(&mut self) {
        let Some((id, expanded)) = self.tree.selected().map(|node| (node.id, node.expanded)) else {
            return;
        };
        if expanded {
            self.tree.collapse(id);
        } else if let Some(mut path) = self.tree.path_to(id) {
            path.pop();
            if !path.is_empty() {
                self.tree.reveal(&path);
            }
        }
    }

    fn refresh_search(&mut self) {
        let query = match self.overlay.as_ref().map(|overlay| &overlay.kind) {
            Some(OverlayKind::Search { query, .. }) => query.clone(),
            _ => return,
        };
        let found = self.tree.search(&query);
        if let Some(OverlayKind::Search { hits, selected, .. }) =
            self.overlay.as_mut().map(|overlay| &mut overlay.kind)
        {
            *hits = found;
            *selected = 0;
        }
    }

    fn open_search(&mut self) -> Vec<Effect> {
        let overlay = Overlay::search().on_confirm(|output| match output {
            OverlayOutput::Selected(hit) => Ok(Some(Effect::Emit(Message::Reveal(hit.path.clone())))),
            _ => Ok(None),
        });
        self.open_overlay(overlay).1
    }

    fn open_preview(&mut self) -> Vec<Effect> {
        let Some(node) = self.tree.selected().cloned() else {
            self.set_status(STATUS_NO_SELECTION);
            return vec![];
        };
        let Some(target) = resource_ref(&node) else {
            self.set_status("Select a workspace or resource to preview");
            return vec![];
        };
        let title = format!("Preview {}", target.describe());
        let (overlay_id, mut effects) = self.open_overlay(Overlay::preview(title));
        effects.push(Effect::LoadPreview {
            overlay_id,
            connection_id: node.connection_id,
            target,
        });
        effects
    }

    fn open_server_info(&mut self) -> Vec<Effect> {
        let Some(config) = self.selected_connection() else {
            self.set_status(STATUS_NO_SELECTION);
            return vec![];
        };
        let title = format!("Server {}", config.label());
        let (overlay_id, mut effects) = self.open_overlay(Overlay::info(title, vec![], true));
        effects.push(Effect::LoadServerInfo {
            overlay_id,
            connection_id: config.id,
        });
        effects
    }

    /// Asks for a file name in the local directory and downloads the
    /// selected layer there.
    fn open_download(&mut self) -> Vec<Effect> {
        let layer = self
            .tree
            .selected()
            .filter(|node| node.kind == NodeKind::Resource(Category::Layers))
            .cloned();
        let Some(layer) = layer else {
            self.set_status("Select a layer to download");
            return vec![];
        };
        let dir = self.browser.cwd.clone();
        let title = format!("Download {}:{}", layer.workspace, layer.name);
        let default_name = format!("{}.geojson", layer.name);
        let overlay = Overlay::input(title, "File name (.geojson or .tif)", default_name)
            .on_confirm(move |output| {
                let OverlayOutput::Text(name) = output else {
                    return Ok(None);
                };
                if name.is_empty() {
                    return Err("File name is required".to_string());
                }
                if name.contains('/') || name.contains('\\') {
                    return Err("Enter a file name, not a path".to_string());
                }
                Ok(Some(Effect::Download {
                    connection_id: layer.connection_id.clone(),
                    workspace: layer.workspace.clone(),
                    layer: layer.name.clone(),
                    path: dir.join(name),
                }))
            });
        self.open_overlay(overlay).1
    }
}
