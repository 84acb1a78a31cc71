use std::fs;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use anyhow::Context;

use crate::app::backend::{DownloadFormat, ResourceClient};
use crate::app::health::probe;
use crate::app::message::{CrudAction, Effect, Message};
use crate::app::registry::ConnectionRegistry;
use crate::app::tree::FetchRequest;
use crate::app::verify::verify_stores;
use crate::model::{Category, NodeKind, ResourceItem};

pub(crate) type BoxedJob = Box<dyn FnOnce() -> Message + Send>;

pub(crate) enum Job {
    Immediate(Message),
    Background(BoxedJob),
}

impl Job {
    /// Runs the job on the calling thread.
    pub(crate) fn run(self) -> Message {
        match self {
            Job::Immediate(message) => message,
            Job::Background(job) => job(),
        }
    }
}

type ClientHandle = Result<Arc<dyn ResourceClient>, String>;

fn with_client<T>(
    client: &ClientHandle,
    f: impl FnOnce(&dyn ResourceClient) -> anyhow::Result<T>,
) -> Result<T, String> {
    let client = client.as_ref().map_err(Clone::clone)?;
    f(&**client).map_err(|err| format!("{err:#}"))
}

fn fetch_children(
    client: &dyn ResourceClient,
    request: &FetchRequest,
) -> anyhow::Result<Vec<ResourceItem>> {
    let ws = request.workspace.as_str();
    match request.kind {
        NodeKind::Connection => client.list_workspaces(),
        NodeKind::Category(Category::DataStores) => client.list_data_stores(ws),
        NodeKind::Category(Category::CoverageStores) => client.list_coverage_stores(ws),
        NodeKind::Category(Category::Styles) => client.list_styles(ws),
        NodeKind::Category(Category::Layers) => client.list_layers(ws),
        NodeKind::Category(Category::LayerGroups) => client.list_layer_groups(ws),
        NodeKind::Workspace | NodeKind::Resource(_) => Ok(vec![]),
    }
}

fn submit(client: &dyn ResourceClient, action: &CrudAction) -> anyhow::Result<()> {
    match action {
        CrudAction::Create { workspace, config } => client.create_resource(workspace, config),
        CrudAction::Update { target, config } => client.update_resource(target, config),
        CrudAction::Delete { target } => client.delete_resource(target),
    }
}

impl Effect {
    /// Resolves the connection client now and packages the remaining work
    /// as a job that owns all of its inputs.
    pub(crate) fn into_job(self, registry: &ConnectionRegistry) -> Job {
        match self {
            Effect::Emit(message) => Job::Immediate(message),
            Effect::LoadChildren(request) => {
                let client = registry.client(&request.connection_id);
                Job::Background(Box::new(move || {
                    let result = with_client(&client, |c| fetch_children(c, &request));
                    Message::ChildrenLoaded { request, result }
                }))
            }
            Effect::LoadResource {
                ticket,
                connection_id,
                target,
            } => {
                let client = registry.client(&connection_id);
                Job::Background(Box::new(move || {
                    let result = with_client(&client, |c| c.get_resource(&target));
                    Message::CrudLoaded {
                        ticket,
                        connection_id,
                        target,
                        result,
                    }
                }))
            }
            Effect::Submit {
                ticket,
                connection_id,
                action,
            } => {
                let client = registry.client(&connection_id);
                Job::Background(Box::new(move || {
                    let result = with_client(&client, |c| submit(c, &action));
                    Message::CrudSubmitted {
                        ticket,
                        summary: action.summary(),
                        result,
                    }
                }))
            }
            Effect::UploadFile {
                batch,
                index,
                connection_id,
                workspace,
                store,
                path,
            } => {
                let client = registry.client(&connection_id);
                Job::Background(Box::new(move || {
                    let result = with_client(&client, |c| c.upload_file(&workspace, &store, &path));
                    Message::UploadFileDone {
                        batch,
                        index,
                        result,
                    }
                }))
            }
            Effect::VerifyUploads {
                batch,
                connection_id,
                workspace,
                stores,
            } => {
                let client = registry.client(&connection_id);
                Job::Background(Box::new(move || {
                    let result = with_client(&client, |c| verify_stores(c, &workspace, &stores));
                    Message::UploadVerified { batch, result }
                }))
            }
            Effect::Probe {
                round,
                connection_id,
                delay,
            } => {
                let client = registry.client(&connection_id);
                Job::Background(Box::new(move || Message::ProbeFinished {
                    round,
                    status: probe(client, connection_id, delay),
                }))
            }
            Effect::LoadPreview {
                overlay_id,
                connection_id,
                target,
            } => {
                let client = registry.client(&connection_id);
                Job::Background(Box::new(move || {
                    let result = with_client(&client, |c| {
                        c.get_resource(&target).map(|config| config.summary_lines())
                    });
                    Message::OverlayLines { overlay_id, result }
                }))
            }
            Effect::LoadServerInfo {
                overlay_id,
                connection_id,
            } => {
                let client = registry.client(&connection_id);
                let label = registry
                    .config(&connection_id)
                    .map(|config| (config.label(), config.url.clone()))
                    .unwrap_or_default();
                Job::Background(Box::new(move || {
                    let result = with_client(&client, |c| {
                        let info = c.server_status()?;
                        let contact = c.get_contact()?;
                        Ok(vec![
                            format!("Connection: {}", label.0),
                            format!("URL: {}", label.1),
                            format!("Version: {}", info.version),
                            format!("Contact: {}", contact.person),
                            format!("Organization: {}", contact.organization),
                            format!("Email: {}", contact.email),
                        ])
                    });
                    Message::OverlayLines { overlay_id, result }
                }))
            }
            Effect::Download {
                connection_id,
                workspace,
                layer,
                path,
            } => {
                let client = registry.client(&connection_id);
                Job::Background(Box::new(move || {
                    let result = with_client(&client, |c| {
                        let format = DownloadFormat::for_destination(&path);
                        let bytes = c.download_layer(&workspace, &layer, format)?;
                        fs::write(&path, &bytes)
                            .with_context(|| format!("write {}", path.display()))?;
                        Ok(bytes.len())
                    });
                    Message::Downloaded { path, result }
                }))
            }
        }
    }
}

/// Starts every effect: emitted messages are queued right away, everything
/// else runs on its own thread and posts its result when done.
pub(crate) fn dispatch(effects: Vec<Effect>, registry: &ConnectionRegistry, tx: &Sender<Message>) {
    for effect in effects {
        match effect.into_job(registry) {
            Job::Immediate(message) => {
                let _ = tx.send(message);
            }
            Job::Background(job) => {
                let tx = tx.clone();
                thread::spawn(move || {
                    let _ = tx.send(job());
                });
            }
        }
    }
}
