use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as Base64Url;
use chrono::Local;
use rand_core::{OsRng, TryRngCore};
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub(crate) const MIN_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct ConnectionConfig {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) name: String,
    pub(crate) url: String,
    pub(crate) user: String,
    pub(crate) password: String,
}

impl ConnectionConfig {
    pub(crate) fn label(&self) -> String {
        if self.name.trim().is_empty() {
            self.url.clone()
        } else {
            self.name.clone()
        }
    }
}

pub(crate) fn new_connection_id() -> String {
    let mut bytes = [0u8; 6];
    let mut rng = OsRng;
    if rng.try_fill_bytes(&mut bytes).is_err() {
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        return format!("conn-{nanos:x}");
    }
    format!("conn-{}", Base64Url.encode(bytes))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Settings {
    #[serde(default = "default_poll_interval")]
    pub(crate) poll_interval_secs: u64,
    #[serde(default)]
    pub(crate) last_local_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            last_local_dir: None,
        }
    }
}

impl Settings {
    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoreFile {
    pub(crate) master: MasterConfig,
    pub(crate) connections: Vec<StoredConnection>,
    #[serde(default)]
    pub(crate) settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct MasterConfig {
    pub(crate) salt_b64: String,
    pub(crate) check: EncryptedBlob,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EncryptedBlob {
    pub(crate) nonce: String,
    pub(crate) ciphertext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredConnection {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) name: String,
    pub(crate) url: String,
    pub(crate) user: String,
    pub(crate) password: EncryptedBlob,
}

/// Resource categories listed beneath a workspace node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Category {
    DataStores,
    CoverageStores,
    Styles,
    Layers,
    LayerGroups,
}

impl Category {
    pub(crate) const ALL: [Category; 5] = [
        Category::DataStores,
        Category::CoverageStores,
        Category::Styles,
        Category::Layers,
        Category::LayerGroups,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Category::DataStores => "Data stores",
            Category::CoverageStores => "Coverage stores",
            Category::Styles => "Styles",
            Category::Layers => "Layers",
            Category::LayerGroups => "Layer groups",
        }
    }

    pub(crate) fn resource_kind(self) -> ResourceKind {
        match self {
            Category::DataStores => ResourceKind::DataStore,
            Category::CoverageStores => ResourceKind::CoverageStore,
            Category::Styles => ResourceKind::Style,
            Category::Layers => ResourceKind::Layer,
            Category::LayerGroups => ResourceKind::LayerGroup,
        }
    }

    /// Whether instances of this category carry a published/enabled flag.
    pub(crate) fn publishable(self) -> bool {
        matches!(
            self,
            Category::DataStores | Category::CoverageStores | Category::Layers
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum NodeKind {
    Connection,
    Workspace,
    Category(Category),
    Resource(Category),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ResourceKind {
    Workspace,
    DataStore,
    CoverageStore,
    Style,
    Layer,
    LayerGroup,
}

impl ResourceKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            ResourceKind::Workspace => "workspace",
            ResourceKind::DataStore => "data store",
            ResourceKind::CoverageStore => "coverage store",
            ResourceKind::Style => "style",
            ResourceKind::Layer => "layer",
            ResourceKind::LayerGroup => "layer group",
        }
    }
}

/// Addresses one remote resource inside a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResourceRef {
    pub(crate) kind: ResourceKind,
    pub(crate) workspace: String,
    pub(crate) name: String,
}

impl ResourceRef {
    pub(crate) fn describe(&self) -> String {
        match self.kind {
            ResourceKind::Workspace => format!("workspace {}", self.name),
            kind => format!("{} {}:{}", kind.label(), self.workspace, self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResourceItem {
    pub(crate) name: String,
    pub(crate) enabled: Option<bool>,
}

impl ResourceItem {
    pub(crate) fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkspaceConfig {
    pub(crate) name: String,
    pub(crate) isolated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoreConfig {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) enabled: bool,
    pub(crate) url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StyleConfig {
    pub(crate) name: String,
    pub(crate) filename: String,
    pub(crate) sld_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LayerConfig {
    pub(crate) name: String,
    pub(crate) enabled: bool,
    pub(crate) advertised: bool,
    pub(crate) default_style: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LayerGroupConfig {
    pub(crate) name: String,
    pub(crate) title: String,
    pub(crate) layers: Vec<String>,
}

/// Editable state of one remote resource, as loaded or as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ResourceConfig {
    Workspace(WorkspaceConfig),
    DataStore(StoreConfig),
    CoverageStore(StoreConfig),
    Style(StyleConfig),
    Layer(LayerConfig),
    LayerGroup(LayerGroupConfig),
}

impl ResourceConfig {
    pub(crate) fn kind(&self) -> ResourceKind {
        match self {
            ResourceConfig::Workspace(_) => ResourceKind::Workspace,
            ResourceConfig::DataStore(_) => ResourceKind::DataStore,
            ResourceConfig::CoverageStore(_) => ResourceKind::CoverageStore,
            ResourceConfig::Style(_) => ResourceKind::Style,
            ResourceConfig::Layer(_) => ResourceKind::Layer,
            ResourceConfig::LayerGroup(_) => ResourceKind::LayerGroup,
        }
    }

    pub(crate) fn name(&self) -> &str {
        match self {
            ResourceConfig::Workspace(config) => &config.name,
            ResourceConfig::DataStore(config) | ResourceConfig::CoverageStore(config) => {
                &config.name
            }
            ResourceConfig::Style(config) => &config.name,
            ResourceConfig::Layer(config) => &config.name,
            ResourceConfig::LayerGroup(config) => &config.name,
        }
    }

    pub(crate) fn summary_lines(&self) -> Vec<String> {
        let flag = |value: bool| if value { "yes" } else { "no" };
        match self {
            ResourceConfig::Workspace(config) => vec![
                format!("Workspace: {}", config.name),
                format!("Isolated: {}", flag(config.isolated)),
            ],
            ResourceConfig::DataStore(config) | ResourceConfig::CoverageStore(config) => vec![
                format!("Store: {}", config.name),
                format!("Description: {}", config.description),
                format!("Enabled: {}", flag(config.enabled)),
                format!("URL: {}", config.url),
            ],
            ResourceConfig::Style(config) => vec![
                format!("Style: {}", config.name),
                format!("File: {}", config.filename),
            ],
            ResourceConfig::Layer(config) => vec![
                format!("Layer: {}", config.name),
                format!("Enabled: {}", flag(config.enabled)),
                format!("Advertised: {}", flag(config.advertised)),
                format!("Default style: {}", config.default_style),
            ],
            ResourceConfig::LayerGroup(config) => {
                let mut lines = vec![
                    format!("Layer group: {}", config.name),
                    format!("Title: {}", config.title),
                    format!("Layers ({}):", config.layers.len()),
                ];
                lines.extend(config.layers.iter().map(|layer| format!("  {layer}")));
                lines
            }
        }
    }
}

/// Local file formats accepted for upload, keyed by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UploadFormat {
    Shapefile,
    GeoPackage,
    GeoTiff,
}

impl UploadFormat {
    pub(crate) fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "zip" => Some(UploadFormat::Shapefile),
            "gpkg" => Some(UploadFormat::GeoPackage),
            "tif" | "tiff" => Some(UploadFormat::GeoTiff),
            _ => None,
        }
    }

    pub(crate) fn store_kind(self) -> ResourceKind {
        match self {
            UploadFormat::Shapefile | UploadFormat::GeoPackage => ResourceKind::DataStore,
            UploadFormat::GeoTiff => ResourceKind::CoverageStore,
        }
    }

    /// Formats whose published feature types can be checked against the local file.
    pub(crate) fn verifiable(self) -> bool {
        matches!(self, UploadFormat::Shapefile)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ServerInfo {
    pub(crate) version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ContactInfo {
    pub(crate) person: String,
    pub(crate) organization: String,
    pub(crate) email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServerStatus {
    pub(crate) connection_id: String,
    pub(crate) online: bool,
    pub(crate) latency_ms: Option<u64>,
    pub(crate) version: Option<String>,
    pub(crate) error: Option<String>,
    pub(crate) checked_at: u64,
}

impl ServerStatus {
    pub(crate) fn offline(connection_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            online: false,
            latency_ms: None,
            version: None,
            error: Some(error.into()),
            checked_at: now_epoch(),
        }
    }
}

/// Bounded FIFO of recent round-trip latencies for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PingHistory {
    samples: VecDeque<u64>,
    capacity: usize,
    pub(crate) updated_at: Option<u64>,
}

impl PingHistory {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            updated_at: None,
        }
    }

    pub(crate) fn push(&mut self, latency_ms: u64, at: u64) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(latency_ms);
        self.updated_at = Some(at);
    }

    pub(crate) fn len(&self) -> usize {
        self.samples.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn samples(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().copied()
    }

    pub(crate) fn last(&self) -> Option<u64> {
        self.samples.back().copied()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FileEntry {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) is_dir: bool,
}

pub(crate) fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

pub(crate) fn format_epoch(ts: u64) -> String {
    let dt = chrono::DateTime::<Local>::from(SystemTime::UNIX_EPOCH + Duration::from_secs(ts));
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_name_over_url() {
        let mut conn = ConnectionConfig {
            id: "a".to_string(),
            name: String::new(),
            url: "http://localhost:8080/geoserver".to_string(),
            user: "admin".to_string(),
            password: "geoserver".to_string(),
        };
        assert_eq!(conn.label(), "http://localhost:8080/geoserver");
        conn.name = "local".to_string();
        assert_eq!(conn.label(), "local");
    }

    #[test]
    fn new_connection_ids_are_distinct() {
        let first = new_connection_id();
        let second = new_connection_id();
        assert!(first.starts_with("conn-"));
        assert_ne!(first, second);
    }

    #[test]
    fn ping_history_evicts_oldest_first() {
        let mut history = PingHistory::with_capacity(3);
        for latency in 1..=5 {
            history.push(latency, latency);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.samples().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(history.updated_at, Some(5));
        assert_eq!(history.last(), Some(5));
    }

    #[test]
    fn settings_enforce_minimum_poll_interval() {
        let settings = Settings {
            poll_interval_secs: 1,
            last_local_dir: None,
        };
        assert_eq!(
            settings.poll_interval(),
            Duration::from_secs(MIN_POLL_INTERVAL_SECS)
        );
    }

    #[test]
    fn store_file_defaults_missing_settings() {
        let json = r#"
        {
          "master": { "salt_b64": "c2FsdA", "check": { "nonce": "a", "ciphertext": "b" } },
          "connections": [
            {
              "id": "conn-1",
              "url": "http://gs/geoserver",
              "user": "admin",
              "password": { "nonce": "a", "ciphertext": "b" }
            }
          ]
        }
        "#;
        let store: StoreFile = serde_json::from_str(json).unwrap();
        assert_eq!(store.connections.len(), 1);
        assert_eq!(store.connections[0].name, "");
        assert_eq!(store.settings.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
    }

    #[test]
    fn upload_format_follows_extension() {
        assert_eq!(
            UploadFormat::from_path(Path::new("/tmp/roads.ZIP")),
            Some(UploadFormat::Shapefile)
        );
        assert_eq!(
            UploadFormat::from_path(Path::new("dem.tiff")).map(UploadFormat::store_kind),
            Some(ResourceKind::CoverageStore)
        );
        assert_eq!(UploadFormat::from_path(Path::new("notes.txt")), None);
        assert!(UploadFormat::Shapefile.verifiable());
        assert!(!UploadFormat::GeoTiff.verifiable());
    }

    #[test]
    fn layer_group_summary_lists_members() {
        let config = ResourceConfig::LayerGroup(LayerGroupConfig {
            name: "base".to_string(),
            title: "Base map".to_string(),
            layers: vec!["roads".to_string(), "rivers".to_string()],
        });
        let lines = config.summary_lines();
        assert!(lines.iter().any(|line| line.contains("Layers (2)")));
        assert!(lines.iter().any(|line| line.trim() == "rivers"));
        assert_eq!(config.kind(), ResourceKind::LayerGroup);
        assert_eq!(config.name(), "base");
    }
}
