pub(crate) const STATUS_READY: &str = "Ready";
pub(crate) const STATUS_CANCELLED: &str = "Cancelled";
pub(crate) const STATUS_BUSY: &str = "Another operation is still running";
pub(crate) const STATUS_NO_SELECTION: &str = "Select a node in the remote tree first";
pub(crate) const STATUS_NO_WORKSPACE: &str = "Select a target workspace in the remote tree";
pub(crate) const STATUS_NO_FILES: &str = "Mark files with Space or select one to upload";
pub(crate) const STATUS_REFRESH_RUNNING: &str = "Status refresh already running";

pub(crate) const LOG_TIMESTAMP_FORMAT: &str = "%m-%d %H:%M:%S";
pub(crate) const LOG_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const LOG_SEPARATOR: &str = " | ";

pub(crate) const LOG_RETENTION_DAYS: i64 = 7;
pub(crate) const LOG_MAX_ENTRIES: usize = 10_000;
pub(crate) const LOG_MAX_IN_MEMORY: usize = 100;

pub(crate) const OVERLAY_CLOSE_TICKS: u8 = 3;

pub(crate) const PING_HISTORY_CAPACITY: usize = 30;
pub(crate) const STAGGER_MIN_MS: u64 = 100;
pub(crate) const STAGGER_MAX_MS: u64 = 2_000;
pub(crate) const STAGGER_SHARE_OF_INTERVAL: f64 = 0.5;

pub(crate) const HELP_LINES: &[&str] = &[
    "Global: q quit, Tab switch panel, ? help, F2 health screen",
    "Remote: arrows/h/l navigate, Enter expand, n new, e edit, x delete",
    "Remote: p preview, / search, r rebuild, d download, i server info",
    "Remote: a add connection, E edit connection, X remove connection",
    "Local: arrows, Enter open, Backspace parent, Space mark, . hidden",
    "Local: u upload marked files, r refresh",
    "Health: arrows select, r refresh now",
];
