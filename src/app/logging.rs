use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDateTime};

use crate::app::App;
use crate::app::constants::{
    LOG_MAX_ENTRIES, LOG_MAX_IN_MEMORY, LOG_PARSE_FORMAT, LOG_RETENTION_DAYS, LOG_SEPARATOR,
    LOG_TIMESTAMP_FORMAT,
};

/// Timestamped activity lines, appended to a file when one is configured and
/// mirrored in a bounded in-memory tail for the UI.
#[derive(Debug, Default)]
pub(crate) struct ActivityLog {
    path: Option<PathBuf>,
    lines: VecDeque<String>,
}

impl ActivityLog {
    /// Opens the log at `path`, dropping expired entries first.
    pub(crate) fn open(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        prune(&path);
        Self {
            path: Some(path),
            lines: VecDeque::new(),
        }
    }

    pub(crate) fn record(&mut self, message: &str) {
        let line = format!(
            "{}{LOG_SEPARATOR}{message}",
            Local::now().format(LOG_TIMESTAMP_FORMAT)
        );
        if let Some(path) = self.path.as_deref() {
            let file = fs::OpenOptions::new().create(true).append(true).open(path);
            if let Ok(mut file) = file {
                let _ = writeln!(file, "{line}");
            }
        }
        if self.lines.len() == LOG_MAX_IN_MEMORY {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// The newest `count` lines, oldest first.
    pub(crate) fn recent(&self, count: usize) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .skip(self.lines.len().saturating_sub(count))
            .map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }
}

impl App {
    pub(crate) fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.log.record(&message);
        self.status = message;
    }

    /// Logs without replacing the status line.
    pub(super) fn log_line(&mut self, message: &str) {
        self.log.record(message);
    }
}

fn entry_time(line: &str, year: i32) -> Option<NaiveDateTime> {
    let (stamp, _) = line.split_once(LOG_SEPARATOR)?;
    NaiveDateTime::parse_from_str(&format!("{year}-{stamp}"), LOG_PARSE_FORMAT).ok()
}

/// Keeps the newest entries inside the retention window; unparsable lines go.
fn prune(path: &Path) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    let now = Local::now();
    let cutoff = now.naive_local() - chrono::Duration::days(LOG_RETENTION_DAYS);
    let kept: Vec<&str> = content
        .lines()
        .filter(|line| entry_time(line, now.year()).is_some_and(|at| at >= cutoff))
        .collect();
    let kept = &kept[kept.len().saturating_sub(LOG_MAX_ENTRIES)..];
    let _ = if kept.is_empty() {
        fs::remove_file(path)
    } else {
        fs::write(path, kept.join("\n") + "\n")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(days_ago: i64, text: &str) -> String {
        let at = Local::now().naive_local() - chrono::Duration::days(days_ago);
        format!("{}{LOG_SEPARATOR}{text}", at.format(LOG_TIMESTAMP_FORMAT))
    }

    #[test]
    fn open_prunes_expired_and_garbled_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo-deck.log");
        let content = format!(
            "{}\n{}\nnot a log line\n",
            stamped(LOG_RETENTION_DAYS + 1, "expired"),
            stamped(1, "recent")
        );
        fs::write(&path, content).unwrap();

        let mut log = ActivityLog::open(path.clone());
        log.record("appended");

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("expired"));
        assert!(!content.contains("not a log line"));
        assert!(content.contains("recent"));
        assert!(content.contains("appended"));
    }

    #[test]
    fn open_removes_file_with_nothing_left() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo-deck.log");
        fs::write(&path, stamped(LOG_RETENTION_DAYS + 3, "stale") + "\n").unwrap();
        ActivityLog::open(path.clone());
        assert!(!path.exists());
    }

    #[test]
    fn set_status_keeps_bounded_history() {
        let mut app = App::for_test();
        for i in 0..(LOG_MAX_IN_MEMORY + 5) {
            app.set_status(format!("step {i}"));
        }
        assert_eq!(app.log.len(), LOG_MAX_IN_MEMORY);
        assert_eq!(app.status, format!("step {}", LOG_MAX_IN_MEMORY + 4));
        let last: Vec<&str> = app.log.recent(1).collect();
        assert!(last[0].ends_with(&app.status));
    }
}
