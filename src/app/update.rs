use std::path::PathBuf;
use std::time::Instant;

use crate::app::App;
use crate::app::constants::STATUS_REFRESH_RUNNING;
use crate::app::message::{Effect, Message};
use crate::app::overlay::OverlayKind;
use crate::app::tree::FetchRequest;
use crate::model::{ResourceItem, ServerStatus};

impl App {
    /// Folds one message into the state and returns the work it asks for.
    /// Never blocks; anything slow comes back later as another message.
    pub(crate) fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Tick(now) => self.on_tick(now),
            Message::ChildrenLoaded { request, result } => self.on_children_loaded(request, result),
            Message::CrudLoaded {
                ticket,
                connection_id,
                target,
                result,
            } => self.on_crud_loaded(ticket, connection_id, target, result),
            Message::CrudSubmit {
                ticket,
                connection_id,
                action,
            } => self.on_crud_submit(ticket, connection_id, action),
            Message::CrudSubmitted {
                ticket,
                summary,
                result,
            } => self.on_crud_submitted(ticket, summary, result),
            Message::CrudCancelled { ticket } => self.on_crud_cancelled(ticket),
            Message::UploadStart {
                connection_id,
                workspace,
                files,
            } => self.start_upload(connection_id, workspace, files),
            Message::UploadProgress {
                batch,
                index,
                total,
                file_name,
            } => self.on_upload_progress(batch, index, total, file_name),
            Message::UploadFileDone {
                batch,
                index,
                result,
            } => self.on_upload_file_done(batch, index, result),
            Message::UploadContinue { batch } => self.on_upload_continue(batch),
            Message::UploadVerified { batch, result } => self.on_upload_verified(batch, result),
            Message::UploadFinished { batch, outcome } => self.on_upload_finished(batch, outcome),
            Message::ProbeFinished { round, status } => self
                .health
                .record(round, status)
                .map(Effect::Emit)
                .into_iter()
                .collect(),
            Message::StatusesUpdated { statuses, manual } => {
                self.on_statuses_updated(statuses, manual);
                vec![]
            }
            Message::OverlayLines { overlay_id, result } => {
                self.on_overlay_lines(overlay_id, result);
                vec![]
            }
            Message::Downloaded { path, result } => {
                self.on_downloaded(path, result);
                vec![]
            }
            Message::ConnectionSaved(config) => self.on_connection_saved(config),
            Message::ConnectionRemoved(id) => self.on_connection_removed(id),
            Message::Reveal(path) => {
                if self.tree.reveal(&path) {
                    self.panel = crate::app::Panel::Remote;
                    self.screen = crate::app::Screen::Browser;
                } else {
                    self.set_status(format!("{} is no longer loaded", path.join(" / ")));
                }
                vec![]
            }
        }
    }

    /// Advances the overlay animation, releases the pending command once the
    /// overlay is gone, and fires the health timer.
    fn on_tick(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.tick();
            if !overlay.is_visible() {
                self.overlay = None;
                effects.extend(self.pending.take());
            }
        }
        if !self.health.in_flight() && self.health.due(now, self.settings.poll_interval()) {
            effects.extend(self.refresh_statuses(false, now));
        }
        effects
    }

    /// Starts a health round over every registered connection. Manual
    /// refreshes drive the loading indicator; timer refreshes stay quiet.
    pub(crate) fn refresh_statuses(&mut self, manual: bool, now: Instant) -> Vec<Effect> {
        let ids: Vec<String> = self
            .registry
            .configs()
            .into_iter()
            .map(|config| config.id)
            .collect();
        let interval = self.settings.poll_interval();
        match self.health.begin_round(&ids, interval, manual, now) {
            Some(effects) => {
                if manual {
                    self.set_status(format!("Checking {} server(s)", ids.len()));
                }
                effects
            }
            None => {
                if manual {
                    self.set_status(STATUS_REFRESH_RUNNING);
                }
                vec![]
            }
        }
    }

    fn on_statuses_updated(&mut self, statuses: Vec<ServerStatus>, manual: bool) {
        let total = statuses.len();
        let online = statuses.iter().filter(|status| status.online).count();
        for status in statuses.iter().filter(|status| !status.online) {
            let name = self
                .registry
                .config(&status.connection_id)
                .map(|config| config.label())
                .unwrap_or_else(|| status.connection_id.clone());
            let error = status.error.as_deref().unwrap_or("offline");
            self.log_line(&format!("{name} offline: {error}"));
        }
        self.health.apply(statuses, manual);
        let summary = format!("{online}/{total} server(s) online");
        if manual {
            self.set_status(summary);
        } else {
            self.log_line(&summary);
        }
    }

    fn on_children_loaded(
        &mut self,
        request: FetchRequest,
        result: Result<Vec<ResourceItem>, String>,
    ) -> Vec<Effect> {
        if let Err(err) = &result {
            if request.generation == self.tree.generation() {
                let name = self
                    .tree
                    .find(request.node)
                    .map(|node| node.name.clone())
                    .unwrap_or_default();
                self.log_line(&format!("Failed to load {name}: {err}"));
            }
        }
        self.tree
            .apply_children(&request, result)
            .into_iter()
            .map(Effect::LoadChildren)
            .collect()
    }

    /// Fills an info or preview overlay. Results for an overlay that has
    /// since been replaced are dropped.
    fn on_overlay_lines(&mut self, overlay_id: u64, result: Result<Vec<String>, String>) {
        let Some(overlay) = self
            .overlay
            .as_mut()
            .filter(|overlay| overlay.id == overlay_id && overlay.is_open())
        else {
            return;
        };
        if let OverlayKind::Info { lines, loading, .. } | OverlayKind::Preview { lines, loading, .. } =
            &mut overlay.kind
        {
            *loading = false;
            match result {
                Ok(loaded) => *lines = loaded,
                Err(err) => {
                    lines.clear();
                    overlay.feedback = Some(err);
                }
            }
        }
    }

    fn on_downloaded(&mut self, path: PathBuf, result: Result<usize, String>) {
        match result {
            Ok(bytes) => {
                self.set_status(format!("Downloaded {bytes} bytes to {}", path.display()));
                self.browser.refresh();
            }
            Err(err) => self.set_status(format!("Download failed: {err}")),
        }
    }
}
