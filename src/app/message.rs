use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;

use crate::app::tree::FetchRequest;
use crate::model::{ConnectionConfig, ResourceConfig, ResourceItem, ResourceRef, ServerStatus};

/// Everything the event loop reacts to: user input, the clock, and the
/// result of exactly one finished effect.
#[derive(Debug, Clone)]
pub(crate) enum Message {
    Key(KeyEvent),
    Tick(Instant),
    ChildrenLoaded {
        request: FetchRequest,
        result: Result<Vec<ResourceItem>, String>,
    },
    CrudLoaded {
        ticket: u64,
        connection_id: String,
        target: ResourceRef,
        result: Result<ResourceConfig, String>,
    },
    CrudSubmit {
        ticket: u64,
        connection_id: String,
        action: CrudAction,
    },
    CrudSubmitted {
        ticket: u64,
        summary: String,
        result: Result<(), String>,
    },
    CrudCancelled {
        ticket: u64,
    },
    UploadStart {
        connection_id: String,
        workspace: String,
        files: Vec<PathBuf>,
    },
    UploadProgress {
        batch: u64,
        index: usize,
        total: usize,
        file_name: String,
    },
    UploadFileDone {
        batch: u64,
        index: usize,
        result: Result<(), String>,
    },
    UploadContinue {
        batch: u64,
    },
    UploadVerified {
        batch: u64,
        result: Result<VerifyReport, String>,
    },
    UploadFinished {
        batch: u64,
        outcome: UploadOutcome,
    },
    ProbeFinished {
        round: u64,
        status: ServerStatus,
    },
    StatusesUpdated {
        statuses: Vec<ServerStatus>,
        manual: bool,
    },
    OverlayLines {
        overlay_id: u64,
        result: Result<Vec<String>, String>,
    },
    Downloaded {
        path: PathBuf,
        result: Result<usize, String>,
    },
    ConnectionSaved(ConnectionConfig),
    ConnectionRemoved(String),
    Reveal(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CrudAction {
    Create {
        workspace: String,
        config: ResourceConfig,
    },
    Update {
        target: ResourceRef,
        config: ResourceConfig,
    },
    Delete {
        target: ResourceRef,
    },
}

impl CrudAction {
    pub(crate) fn summary(&self) -> String {
        match self {
            CrudAction::Create { workspace, config } if workspace.is_empty() => {
                format!("Created {} {}", config.kind().label(), config.name())
            }
            CrudAction::Create { workspace, config } => {
                format!(
                    "Created {} {workspace}:{}",
                    config.kind().label(),
                    config.name()
                )
            }
            CrudAction::Update { target, .. } => format!("Updated {}", target.describe()),
            CrudAction::Delete { target } => format!("Deleted {}", target.describe()),
        }
    }
}

/// Shapefile layers found in an uploaded archive, checked against the
/// feature types the server published for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct VerifyReport {
    pub(crate) checked: Vec<String>,
    pub(crate) missing: Vec<String>,
}

impl VerifyReport {
    pub(crate) fn passed(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UploadFailure {
    pub(crate) index: usize,
    pub(crate) file_name: String,
    pub(crate) error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UploadOutcome {
    pub(crate) total: usize,
    pub(crate) uploaded: usize,
    pub(crate) failure: Option<UploadFailure>,
    /// `None` when nothing in the batch could be verified.
    pub(crate) verified: Option<bool>,
    pub(crate) verify_detail: Option<String>,
}

impl UploadOutcome {
    pub(crate) fn success(&self) -> bool {
        self.failure.is_none()
    }
}

/// A unit of work requested by `App::update`. Effects are plain data; the
/// runner turns them into jobs that post exactly one [`Message`] back.
#[derive(Debug, Clone)]
pub(crate) enum Effect {
    Emit(Message),
    LoadChildren(FetchRequest),
    LoadResource {
        ticket: u64,
        connection_id: String,
        target: ResourceRef,
    },
    Submit {
        ticket: u64,
        connection_id: String,
        action: CrudAction,
    },
    UploadFile {
        batch: u64,
        index: usize,
        connection_id: String,
        workspace: String,
        store: String,
        path: PathBuf,
    },
    VerifyUploads {
        batch: u64,
        connection_id: String,
        workspace: String,
        stores: Vec<(String, PathBuf)>,
    },
    Probe {
        round: u64,
        connection_id: String,
        delay: Duration,
    },
    LoadPreview {
        overlay_id: u64,
        connection_id: String,
        target: ResourceRef,
    },
    LoadServerInfo {
        overlay_id: u64,
        connection_id: String,
    },
    Download {
        connection_id: String,
        workspace: String,
        layer: String,
        path: PathBuf,
    },
}
