use std::path::{Path, PathBuf};

use crate::app::App;
use crate::app::constants::{STATUS_BUSY, STATUS_NO_FILES, STATUS_NO_WORKSPACE};
use crate::app::message::{Effect, Message, UploadFailure, UploadOutcome, VerifyReport};
use crate::app::overlay::{Overlay, OverlayKind};
use crate::model::UploadFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UploadItem {
    pub(crate) path: PathBuf,
    pub(crate) store: String,
    pub(crate) format: UploadFormat,
}

impl UploadItem {
    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// The batch being uploaded. Files go up strictly one after another; the
/// cursor only advances when the previous file's result has been handled.
#[derive(Debug, Clone)]
pub(crate) struct UploadBatch {
    pub(crate) id: u64,
    pub(crate) connection_id: String,
    pub(crate) workspace: String,
    pub(crate) items: Vec<UploadItem>,
    pub(crate) cursor: usize,
    pub(crate) overlay_id: u64,
}

/// Store name derived from the file stem, restricted to characters the
/// server accepts in resource names.
pub(crate) fn sanitize_store_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name: String = stem
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        String::from("upload")
    } else {
        name
    }
}

fn plan_items(files: &[PathBuf]) -> Result<Vec<UploadItem>, Vec<String>> {
    let mut items = Vec::with_capacity(files.len());
    let mut unsupported = Vec::new();
    for path in files {
        match UploadFormat::from_path(path) {
            Some(format) => items.push(UploadItem {
                path: path.clone(),
                store: sanitize_store_name(path),
                format,
            }),
            None => unsupported.push(
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            ),
        }
    }
    if unsupported.is_empty() {
        Ok(items)
    } else {
        Err(unsupported)
    }
}

fn outcome_summary(workspace: &str, outcome: &UploadOutcome) -> String {
    if let Some(failure) = &outcome.failure {
        return format!(
            "Upload stopped at {} ({}/{}): {}",
            failure.file_name,
            failure.index + 1,
            outcome.total,
            failure.error
        );
    }
    let mut summary = format!("Uploaded {} file(s) to {workspace}", outcome.uploaded);
    if let Some(detail) = &outcome.verify_detail {
        summary.push_str(&format!(" ({detail})"));
    }
    summary
}

impl App {
    /// Upload the marked local files (or the selected one) into the
    /// workspace selected in the remote tree.
    pub(crate) fn request_upload(&mut self) -> Vec<Effect> {
        let files = self.browser.selected_files();
        if files.is_empty() {
            self.set_status(STATUS_NO_FILES);
            return vec![];
        }
        let target = self
            .tree
            .selected()
            .filter(|node| !node.workspace.is_empty())
            .map(|node| (node.connection_id.clone(), node.workspace.clone()));
        let Some((connection_id, workspace)) = target else {
            self.set_status(STATUS_NO_WORKSPACE);
            return vec![];
        };
        vec![Effect::Emit(Message::UploadStart {
            connection_id,
            workspace,
            files,
        })]
    }

    pub(crate) fn start_upload(
        &mut self,
        connection_id: String,
        workspace: String,
        files: Vec<PathBuf>,
    ) -> Vec<Effect> {
        if self.upload.is_some() {
            self.set_status(STATUS_BUSY);
            return vec![];
        }
        if files.is_empty() {
            self.set_status(STATUS_NO_FILES);
            return vec![];
        }
        let items = match plan_items(&files) {
            Ok(items) => items,
            Err(unsupported) => {
                self.set_status(format!(
                    "Unsupported file(s): {} (use .zip, .gpkg, .tif)",
                    unsupported.join(", ")
                ));
                return vec![];
            }
        };
        let id = self.next_batch();
        let title = format!("Upload to {workspace}");
        let (overlay_id, mut effects) = self.open_overlay(Overlay::progress(title, items.len()));
        self.log_line(&format!(
            "Uploading {} file(s) to {workspace}",
            items.len()
        ));
        self.upload = Some(UploadBatch {
            id,
            connection_id,
            workspace,
            items,
            cursor: 0,
            overlay_id,
        });
        effects.extend(self.upload_step());
        effects
    }

    /// Progress first, then the upload of the file under the cursor.
    fn upload_step(&self) -> Vec<Effect> {
        let Some(batch) = self.upload.as_ref() else {
            return vec![];
        };
        let Some(item) = batch.items.get(batch.cursor) else {
            return vec![];
        };
        vec![
            Effect::Emit(Message::UploadProgress {
                batch: batch.id,
                index: batch.cursor,
                total: batch.items.len(),
                file_name: item.file_name(),
            }),
            Effect::UploadFile {
                batch: batch.id,
                index: batch.cursor,
                connection_id: batch.connection_id.clone(),
                workspace: batch.workspace.clone(),
                store: item.store.clone(),
                path: item.path.clone(),
            },
        ]
    }

    fn active_batch(&self, id: u64) -> Option<&UploadBatch> {
        self.upload.as_ref().filter(|batch| batch.id == id)
    }

    fn progress_overlay(&mut self, overlay_id: u64) -> Option<&mut OverlayKind> {
        self.overlay
            .as_mut()
            .filter(|overlay| overlay.id == overlay_id)
            .map(|overlay| &mut overlay.kind)
    }

    pub(crate) fn on_upload_progress(
        &mut self,
        batch: u64,
        index: usize,
        total: usize,
        file_name: String,
    ) -> Vec<Effect> {
        let Some(overlay_id) = self.active_batch(batch).map(|batch| batch.overlay_id) else {
            return vec![];
        };
        let line = format!("[{}/{total}] {file_name}", index + 1);
        if let Some(OverlayKind::Progress { lines, current, .. }) =
            self.progress_overlay(overlay_id)
        {
            lines.push(line);
            *current = index + 1;
        }
        self.set_status(format!("Uploading {file_name} ({}/{total})", index + 1));
        vec![]
    }

    pub(crate) fn on_upload_file_done(
        &mut self,
        batch: u64,
        index: usize,
        result: Result<(), String>,
    ) -> Vec<Effect> {
        let Some(active) = self.active_batch(batch).filter(|active| active.cursor == index) else {
            return vec![];
        };
        let total = active.items.len();
        let Some(item) = active.items.get(index).cloned() else {
            return vec![];
        };
        if let Err(error) = result {
            let outcome = UploadOutcome {
                total,
                uploaded: index,
                failure: Some(UploadFailure {
                    index,
                    file_name: item.file_name(),
                    error,
                }),
                verified: None,
                verify_detail: None,
            };
            return vec![Effect::Emit(Message::UploadFinished { batch, outcome })];
        }
        if index + 1 < total {
            return vec![Effect::Emit(Message::UploadContinue { batch })];
        }
        let stores: Vec<(String, PathBuf)> = active
            .items
            .iter()
            .filter(|item| item.format.verifiable())
            .map(|item| (item.store.clone(), item.path.clone()))
            .collect();
        if stores.is_empty() {
            let outcome = UploadOutcome {
                total,
                uploaded: total,
                ..UploadOutcome::default()
            };
            return vec![Effect::Emit(Message::UploadFinished { batch, outcome })];
        }
        self.set_status(format!("Verifying {} upload(s)", stores.len()));
        let Some(active) = self.active_batch(batch) else {
            return vec![];
        };
        vec![Effect::VerifyUploads {
            batch,
            connection_id: active.connection_id.clone(),
            workspace: active.workspace.clone(),
            stores,
        }]
    }

    pub(crate) fn on_upload_continue(&mut self, batch: u64) -> Vec<Effect> {
        match self.upload.as_mut().filter(|active| active.id == batch) {
            Some(active) => active.cursor += 1,
            None => return vec![],
        }
        self.upload_step()
    }

    pub(crate) fn on_upload_verified(
        &mut self,
        batch: u64,
        result: Result<VerifyReport, String>,
    ) -> Vec<Effect> {
        let Some(total) = self.active_batch(batch).map(|active| active.items.len()) else {
            return vec![];
        };
        let (verified, detail) = match result {
            Ok(report) if report.passed() => (
                true,
                format!("verified {} layer(s)", report.checked.len()),
            ),
            Ok(report) => (
                false,
                format!("missing layer(s): {}", report.missing.join(", ")),
            ),
            Err(err) => (false, format!("verification failed: {err}")),
        };
        let outcome = UploadOutcome {
            total,
            uploaded: total,
            failure: None,
            verified: Some(verified),
            verify_detail: Some(detail),
        };
        vec![Effect::Emit(Message::UploadFinished { batch, outcome })]
    }

    pub(crate) fn on_upload_finished(&mut self, batch: u64, outcome: UploadOutcome) -> Vec<Effect> {
        let Some(finished) = self.upload.take_if(|active| active.id == batch) else {
            return vec![];
        };
        let summary = outcome_summary(&finished.workspace, &outcome);
        if let Some(OverlayKind::Progress { lines, done, .. }) =
            self.progress_overlay(finished.overlay_id)
        {
            lines.push(summary.clone());
            *done = true;
        }
        self.set_status(summary);
        if outcome.uploaded == 0 {
            return vec![];
        }
        self.rebuild_tree()
    }
}
