use std::time::Instant;

use anyhow::{Context, Result};

use crate::app::App;
use crate::app::constants::STATUS_NO_SELECTION;
use crate::app::message::{Effect, Message};
use crate::app::overlay::{Overlay, OverlayOutput};
use crate::app::wizard::{connection_config, connection_form};
use crate::model::{ConnectionConfig, new_connection_id};
use crate::storage::{build_store_file, save_store};

impl App {
    pub(crate) fn selected_connection(&self) -> Option<ConnectionConfig> {
        let node = self.tree.selected()?;
        self.registry.config(&node.connection_id).cloned()
    }

    /// Opens the connection wizard, prefilled when `existing` is given.
    pub(crate) fn open_connection_wizard(&mut self, existing: Option<ConnectionConfig>) -> Vec<Effect> {
        let title = if existing.is_some() {
            "Edit connection"
        } else {
            "New connection"
        };
        let form = connection_form(existing.as_ref());
        let id = existing
            .map(|config| config.id)
            .unwrap_or_else(new_connection_id);
        let overlay = Overlay::wizard(title, form).on_confirm(move |output| {
            let OverlayOutput::Form(form) = output else {
                return Ok(None);
            };
            let config = connection_config(form, id.clone())?;
            Ok(Some(Effect::Emit(Message::ConnectionSaved(config))))
        });
        self.open_overlay(overlay).1
    }

    pub(crate) fn edit_selected_connection(&mut self) -> Vec<Effect> {
        match self.selected_connection() {
            Some(config) => self.open_connection_wizard(Some(config)),
            None => {
                self.set_status(STATUS_NO_SELECTION);
                vec![]
            }
        }
    }

    pub(crate) fn confirm_remove_connection(&mut self) -> Vec<Effect> {
        let Some(config) = self.selected_connection() else {
            self.set_status(STATUS_NO_SELECTION);
            return vec![];
        };
        let message = format!("Remove connection {}?", config.label());
        let id = config.id;
        let overlay = Overlay::confirm("Remove connection", message)
            .on_confirm(move |_| Ok(Some(Effect::Emit(Message::ConnectionRemoved(id.clone())))));
        self.open_overlay(overlay).1
    }

    pub(crate) fn on_connection_saved(&mut self, config: ConnectionConfig) -> Vec<Effect> {
        let added = self.registry.config(&config.id).is_none();
        let id = config.id.clone();
        let label = config.label();
        self.registry.upsert(config);
        self.health.forget(&id);
        self.persist();
        self.set_status(if added {
            format!("Added connection {label}")
        } else {
            format!("Saved connection {label}")
        });
        let mut effects = self.connections_changed();
        if added {
            let root = self
                .tree
                .roots()
                .iter()
                .find(|node| node.connection_id == id)
                .map(|node| node.id);
            if let Some(request) = root.and_then(|root| self.tree.expand(root)) {
                effects.push(Effect::LoadChildren(request));
            }
        }
        effects
    }

    pub(crate) fn on_connection_removed(&mut self, id: String) -> Vec<Effect> {
        let Some(removed) = self.registry.remove(&id) else {
            return vec![];
        };
        self.health.forget(&id);
        self.persist();
        self.set_status(format!("Removed connection {}", removed.label()));
        self.connections_changed()
    }

    /// Rebuilds the tree for the new membership and restarts the health
    /// round so it covers exactly the current connections.
    fn connections_changed(&mut self) -> Vec<Effect> {
        let mut effects = self.rebuild_tree();
        self.health.abandon_round();
        effects.extend(self.refresh_statuses(false, Instant::now()));
        effects
    }

    pub(crate) fn save_config(&self) -> Result<()> {
        let (Some(path), Some((master, key))) = (self.config_path.as_deref(), self.master.as_ref())
        else {
            return Ok(());
        };
        let store = build_store_file(master, key, &self.registry.configs(), &self.settings)?;
        save_store(path, &store).context("save configuration")
    }

    /// Saves the store, reporting failures on the status line.
    pub(crate) fn persist(&mut self) {
        if let Err(err) = self.save_config() {
            self.set_status(format!("Failed to save config: {err:#}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::KeyCode;

    use super::*;
    use crate::app::backend::MockResourceClient;
    use crate::app::harness::Harness;
    use crate::storage::{create_master_from_password, load_store};

    fn conn(id: &str, name: &str) -> ConnectionConfig {
        ConnectionConfig {
            id: id.to_string(),
            name: name.to_string(),
            url: format!("http://{id}:8080/geoserver"),
            user: "admin".to_string(),
            password: "s3cret-pass".to_string(),
        }
    }

    #[test]
    fn adding_a_connection_loads_it_and_probes_every_server() {
        let client = Arc::new(MockResourceClient::default());
        client.set_list("workspaces", "", &["demo"]);
        let mut harness = Harness::with_connections(client.clone(), vec![conn("a", "alpha")]);
        harness.start();

        harness.press(KeyCode::Char('a'));
        harness.type_text("beta");
        harness.press(KeyCode::Tab);
        for _ in 0.."http://localhost:8080/geoserver".len() {
            harness.press(KeyCode::Backspace);
        }
        harness.type_text("http://b:8080/geoserver");
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Tab);
        harness.type_text("secret");
        harness.press(KeyCode::Enter);
        harness.close_overlay();

        assert_eq!(harness.app.registry.len(), 2);
        let roots: Vec<_> = harness
            .app
            .tree
            .roots()
            .iter()
            .map(|node| (node.name.clone(), node.children.len()))
            .collect();
        assert_eq!(
            roots,
            vec![("alpha".to_string(), 1), ("beta".to_string(), 1)]
        );
        assert_eq!(harness.app.status, "Added connection beta");
        assert_eq!(harness.app.health.statuses.len(), 2);
    }

    #[test]
    fn removing_a_connection_forgets_its_status() {
        let client = Arc::new(MockResourceClient::default());
        let mut harness = Harness::with_connections(
            client,
            vec![conn("a", "alpha"), conn("b", "beta")],
        );
        harness.start();
        assert_eq!(harness.app.health.statuses.len(), 2);

        harness.send(Message::Reveal(vec!["beta".to_string()]));
        harness.press(KeyCode::Char('X'));
        harness.press(KeyCode::Enter);
        harness.close_overlay();

        assert_eq!(harness.app.registry.len(), 1);
        assert!(!harness.app.health.statuses.contains_key("b"));
        assert_eq!(harness.app.tree.roots().len(), 1);
        assert_eq!(harness.app.status, "Removed connection beta");
    }

    #[test]
    fn persist_writes_encrypted_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut app = App::for_test();
        app.config_path = Some(path.clone());
        app.master = Some(create_master_from_password("pw").unwrap());
        app.on_connection_saved(conn("a", "alpha"));

        let stored = load_store(&path).unwrap();
        assert_eq!(stored.connections.len(), 1);
        assert_eq!(stored.connections[0].name, "alpha");
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("s3cret-pass"));
    }

    #[test]
    fn edit_without_selection_reports_status() {
        let mut app = App::for_test();
        assert!(app.edit_selected_connection().is_empty());
        assert_eq!(app.status, STATUS_NO_SELECTION);
    }
}
