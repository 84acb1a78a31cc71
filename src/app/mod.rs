use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::app::browser::{LocalBrowser, resolve_start_dir};
use crate::app::constants::STATUS_READY;
use crate::app::crud::CrudPhase;
use crate::app::health::HealthState;
use crate::app::logging::ActivityLog;
use crate::app::message::Effect;
use crate::app::overlay::Overlay;
use crate::app::registry::{ConnectionRegistry, RestClientFactory};
use crate::app::tree::ResourceTree;
use crate::app::upload::UploadBatch;
use crate::model::{MasterConfig, Settings};
use crate::storage::{config_path, load_or_init_store, log_path};

pub(crate) mod backend;
mod browser;
mod connections;
pub(crate) mod constants;
mod crud;
pub(crate) mod effects;
mod handlers;
pub(crate) mod health;
mod logging;
pub(crate) mod message;
pub(crate) mod overlay;
pub(crate) mod registry;
pub(crate) mod tree;
mod update;
mod upload;
mod verify;
pub(crate) mod wizard;

#[cfg(test)]
pub(crate) mod harness;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Browser,
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Panel {
    Local,
    Remote,
}

pub(crate) struct App {
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) status: String,
    pub(crate) log: ActivityLog,
    pub(crate) master: Option<(MasterConfig, Vec<u8>)>,
    pub(crate) settings: Settings,
    pub(crate) registry: ConnectionRegistry,
    pub(crate) tree: ResourceTree,
    pub(crate) browser: LocalBrowser,
    pub(crate) screen: Screen,
    pub(crate) panel: Panel,
    pub(crate) overlay: Option<Overlay>,
    pub(crate) pending: Option<Effect>,
    next_overlay_id: u64,
    pub(crate) crud: CrudPhase,
    next_ticket: u64,
    pub(crate) upload: Option<UploadBatch>,
    next_batch: u64,
    pub(crate) health: HealthState,
    pub(crate) should_quit: bool,
}

impl App {
    pub(crate) fn load_with_master() -> Result<Self> {
        let config_path = config_path()?;
        let store = load_or_init_store(&config_path)?;
        let log = ActivityLog::open(log_path()?);
        let start_dir = resolve_start_dir(store.settings.last_local_dir.as_deref())?;
        let registry = ConnectionRegistry::new(Arc::new(RestClientFactory), store.connections);
        let mut app = Self::with_parts(
            registry,
            store.settings,
            LocalBrowser::new(start_dir),
            Some(config_path),
            log,
        );
        app.master = Some((store.master, store.master_key));
        app.set_status(STATUS_READY);
        Ok(app)
    }

    fn with_parts(
        registry: ConnectionRegistry,
        settings: Settings,
        browser: LocalBrowser,
        config_path: Option<PathBuf>,
        log: ActivityLog,
    ) -> Self {
        let mut tree = ResourceTree::default();
        tree.rebuild(&registry.tree_roots());
        Self {
            config_path,
            log,
            status: STATUS_READY.to_string(),
            master: None,
            settings,
            registry,
            tree,
            browser,
            screen: Screen::Browser,
            panel: Panel::Remote,
            overlay: None,
            pending: None,
            next_overlay_id: 0,
            crud: CrudPhase::Idle,
            next_ticket: 0,
            upload: None,
            next_batch: 0,
            health: HealthState::default(),
            should_quit: false,
        }
    }

    /// Loads the top level of every connection and runs the first health
    /// round.
    pub(crate) fn startup(&mut self, now: std::time::Instant) -> Vec<Effect> {
        let mut effects = self.expand_roots();
        effects.extend(self.refresh_statuses(false, now));
        effects
    }

    pub(crate) fn expand_roots(&mut self) -> Vec<Effect> {
        let ids: Vec<_> = self.tree.roots().iter().map(|node| node.id).collect();
        ids.into_iter()
            .filter_map(|id| self.tree.expand(id))
            .map(Effect::LoadChildren)
            .collect()
    }

    pub(crate) fn next_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    pub(crate) fn next_batch(&mut self) -> u64 {
        self.next_batch += 1;
        self.next_batch
    }

    /// Puts `overlay` into the single overlay slot. An open overlay it
    /// replaces is dropped without running its cancel handler; one that is
    /// already closing releases its pending command first.
    pub(crate) fn open_overlay(&mut self, mut overlay: Overlay) -> (u64, Vec<Effect>) {
        let mut effects = Vec::new();
        if let Some(previous) = self.overlay.take() {
            if previous.is_open() {
                self.crud.overlay_replaced(previous.id);
            }
            effects.extend(self.pending.take());
        }
        self.next_overlay_id += 1;
        overlay.id = self.next_overlay_id;
        self.overlay = Some(overlay);
        (self.next_overlay_id, effects)
    }

    /// Rebuilds the tree from the registry and restores the previous view.
    pub(crate) fn rebuild_tree(&mut self) -> Vec<Effect> {
        let snapshot = self.tree.snapshot();
        self.tree.rebuild(&self.registry.tree_roots());
        self.tree
            .restore(snapshot)
            .into_iter()
            .map(Effect::LoadChildren)
            .collect()
    }

    /// Remembers the local directory and writes the store one last time.
    pub(crate) fn shutdown(&mut self) -> Result<()> {
        self.settings.last_local_dir = Some(self.browser.cwd.to_string_lossy().into_owned());
        self.save_config()
    }
}

#[cfg(test)]
impl App {
    pub(crate) fn for_test() -> Self {
        let client = Arc::new(crate::app::backend::MockResourceClient::default());
        Self::for_test_with(
            crate::app::registry::MockFactory::shared(client),
            vec![],
            std::env::temp_dir(),
        )
    }

    pub(crate) fn for_test_with(
        factory: crate::app::registry::MockFactory,
        connections: Vec<crate::model::ConnectionConfig>,
        local_dir: PathBuf,
    ) -> Self {
        let registry = ConnectionRegistry::new(Arc::new(factory), connections);
        let settings = Settings {
            poll_interval_secs: crate::model::MIN_POLL_INTERVAL_SECS,
            last_local_dir: None,
        };
        Self::with_parts(
            registry,
            settings,
            LocalBrowser::new(local_dir),
            None,
            ActivityLog::default(),
        )
    }
}
