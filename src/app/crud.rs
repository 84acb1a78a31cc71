use crate::app::App;
use crate::app::constants::{STATUS_BUSY, STATUS_CANCELLED, STATUS_NO_SELECTION};
use crate::app::message::{CrudAction, Effect, Message};
use crate::app::overlay::{Overlay, OverlayOutput};
use crate::app::tree::Node;
use crate::app::wizard::{resource_config, resource_form};
use crate::model::{Category, NodeKind, ResourceConfig, ResourceKind, ResourceRef};

/// Where the single create/edit/delete flow currently stands. Every
/// non-idle phase carries the ticket of the flow that owns it; messages for
/// any other ticket are stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CrudPhase {
    Idle,
    Confirming { ticket: u64, overlay_id: u64 },
    LoadingRemoteState { ticket: u64 },
    WizardOpen { ticket: u64, overlay_id: u64 },
    Submitting { ticket: u64 },
}

impl CrudPhase {
    pub(crate) fn is_idle(&self) -> bool {
        matches!(self, CrudPhase::Idle)
    }

    /// Short label for the header while a request is outstanding.
    pub(crate) fn activity(&self) -> Option<&'static str> {
        match self {
            CrudPhase::LoadingRemoteState { .. } => Some("loading resource"),
            CrudPhase::Submitting { .. } => Some("saving"),
            _ => None,
        }
    }

    /// The overlay owning this flow was replaced before the user answered.
    pub(crate) fn overlay_replaced(&mut self, overlay_id: u64) {
        let owned = match *self {
            CrudPhase::Confirming { overlay_id: id, .. }
            | CrudPhase::WizardOpen { overlay_id: id, .. } => id == overlay_id,
            _ => false,
        };
        if owned {
            *self = CrudPhase::Idle;
        }
    }

    fn awaiting_answer(&self, ticket: u64) -> bool {
        matches!(
            *self,
            CrudPhase::Confirming { ticket: t, .. } | CrudPhase::WizardOpen { ticket: t, .. }
                if t == ticket
        )
    }
}

/// What a create on `node` makes and in which workspace.
fn create_target(node: &Node) -> Result<(ResourceKind, String), &'static str> {
    match node.kind {
        NodeKind::Connection | NodeKind::Workspace => Ok((ResourceKind::Workspace, String::new())),
        NodeKind::Category(Category::Layers) | NodeKind::Resource(Category::Layers) => {
            Err("Layers are published by uploads or stores, not created directly")
        }
        NodeKind::Category(category) | NodeKind::Resource(category) => {
            Ok((category.resource_kind(), node.workspace.clone()))
        }
    }
}

pub(crate) fn resource_ref(node: &Node) -> Option<ResourceRef> {
    match node.kind {
        NodeKind::Workspace => Some(ResourceRef {
            kind: ResourceKind::Workspace,
            workspace: node.workspace.clone(),
            name: node.name.clone(),
        }),
        NodeKind::Resource(category) => Some(ResourceRef {
            kind: category.resource_kind(),
            workspace: node.workspace.clone(),
            name: node.name.clone(),
        }),
        NodeKind::Connection | NodeKind::Category(_) => None,
    }
}

fn cancelled(ticket: u64) -> Option<Effect> {
    Some(Effect::Emit(Message::CrudCancelled { ticket }))
}

impl App {
    fn crud_ready(&mut self) -> Option<Node> {
        if !self.crud.is_idle() {
            self.set_status(STATUS_BUSY);
            return None;
        }
        let node = self.tree.selected().cloned();
        if node.is_none() {
            self.set_status(STATUS_NO_SELECTION);
        }
        node
    }

    pub(crate) fn begin_create(&mut self) -> Vec<Effect> {
        let Some(node) = self.crud_ready() else {
            return vec![];
        };
        let (kind, workspace) = match create_target(&node) {
            Ok(target) => target,
            Err(reason) => {
                self.set_status(reason);
                return vec![];
            }
        };
        let ticket = self.next_ticket();
        let connection_id = node.connection_id.clone();
        let title = if workspace.is_empty() {
            format!("New {}", kind.label())
        } else {
            format!("New {} in {workspace}", kind.label())
        };
        let overlay = Overlay::wizard(title, resource_form(kind, None))
            .on_confirm(move |output| {
                let OverlayOutput::Form(form) = output else {
                    return Ok(None);
                };
                let config = resource_config(kind, form)?;
                Ok(Some(Effect::Emit(Message::CrudSubmit {
                    ticket,
                    connection_id: connection_id.clone(),
                    action: CrudAction::Create {
                        workspace: workspace.clone(),
                        config,
                    },
                })))
            })
            .on_cancel(move || cancelled(ticket));
        let (overlay_id, effects) = self.open_overlay(overlay);
        self.crud = CrudPhase::WizardOpen { ticket, overlay_id };
        effects
    }

    /// Edits never open the wizard straight away: the current remote state is
    /// fetched first and the wizard is built from it once it arrives.
    pub(crate) fn begin_edit(&mut self) -> Vec<Effect> {
        let Some(node) = self.crud_ready() else {
            return vec![];
        };
        let Some(target) = resource_ref(&node) else {
            self.set_status("Select a workspace or resource to edit");
            return vec![];
        };
        let ticket = self.next_ticket();
        self.crud = CrudPhase::LoadingRemoteState { ticket };
        self.set_status(format!("Loading {}", target.describe()));
        vec![Effect::LoadResource {
            ticket,
            connection_id: node.connection_id,
            target,
        }]
    }

    pub(crate) fn begin_delete(&mut self) -> Vec<Effect> {
        let Some(node) = self.crud_ready() else {
            return vec![];
        };
        let Some(target) = resource_ref(&node) else {
            self.set_status("Select a workspace or resource to delete");
            return vec![];
        };
        let ticket = self.next_ticket();
        let message = match target.kind {
            ResourceKind::Workspace => {
                format!("Delete {} and everything in it?", target.describe())
            }
            ResourceKind::DataStore | ResourceKind::CoverageStore => {
                format!("Delete {} and its layers?", target.describe())
            }
            _ => format!("Delete {}?", target.describe()),
        };
        let connection_id = node.connection_id;
        let overlay = Overlay::confirm("Delete", message)
            .on_confirm(move |_| {
                Ok(Some(Effect::Emit(Message::CrudSubmit {
                    ticket,
                    connection_id: connection_id.clone(),
                    action: CrudAction::Delete {
                        target: target.clone(),
                    },
                })))
            })
            .on_cancel(move || cancelled(ticket));
        let (overlay_id, effects) = self.open_overlay(overlay);
        self.crud = CrudPhase::Confirming { ticket, overlay_id };
        effects
    }

    pub(crate) fn on_crud_loaded(
        &mut self,
        ticket: u64,
        connection_id: String,
        target: ResourceRef,
        result: Result<ResourceConfig, String>,
    ) -> Vec<Effect> {
        if self.crud != (CrudPhase::LoadingRemoteState { ticket }) {
            return vec![];
        }
        let existing = match result {
            Ok(config) => config,
            Err(err) => {
                self.crud = CrudPhase::Idle;
                self.set_status(format!("Failed to load {}: {err}", target.describe()));
                return vec![];
            }
        };
        if self.overlay.as_ref().is_some_and(|overlay| overlay.is_open()) {
            self.crud = CrudPhase::Idle;
            self.set_status(format!(
                "Edit of {} dropped: another dialog is open",
                target.describe()
            ));
            return vec![];
        }
        let kind = target.kind;
        let form = resource_form(kind, Some(&existing));
        let title = format!("Edit {}", target.describe());
        let overlay = Overlay::wizard(title, form)
            .on_confirm(move |output| {
                let OverlayOutput::Form(form) = output else {
                    return Ok(None);
                };
                let config = resource_config(kind, form)?;
                Ok(Some(Effect::Emit(Message::CrudSubmit {
                    ticket,
                    connection_id: connection_id.clone(),
                    action: CrudAction::Update {
                        target: target.clone(),
                        config,
                    },
                })))
            })
            .on_cancel(move || cancelled(ticket));
        let (overlay_id, effects) = self.open_overlay(overlay);
        self.crud = CrudPhase::WizardOpen { ticket, overlay_id };
        self.set_status("Edit the fields and press Enter to save");
        effects
    }

    pub(crate) fn on_crud_submit(
        &mut self,
        ticket: u64,
        connection_id: String,
        action: CrudAction,
    ) -> Vec<Effect> {
        if !self.crud.awaiting_answer(ticket) {
            return vec![];
        }
        self.crud = CrudPhase::Submitting { ticket };
        self.set_status("Submitting...");
        vec![Effect::Submit {
            ticket,
            connection_id,
            action,
        }]
    }

    pub(crate) fn on_crud_submitted(
        &mut self,
        ticket: u64,
        summary: String,
        result: Result<(), String>,
    ) -> Vec<Effect> {
        if self.crud != (CrudPhase::Submitting { ticket }) {
            return vec![];
        }
        self.crud = CrudPhase::Idle;
        match result {
            Ok(()) => {
                self.set_status(summary);
                self.rebuild_tree()
            }
            Err(err) => {
                self.set_status(format!("Request failed: {err}"));
                vec![]
            }
        }
    }

    pub(crate) fn on_crud_cancelled(&mut self, ticket: u64) -> Vec<Effect> {
        if self.crud.awaiting_answer(ticket) {
            self.crud = CrudPhase::Idle;
            self.set_status(STATUS_CANCELLED);
        }
        vec![]
    }
}
