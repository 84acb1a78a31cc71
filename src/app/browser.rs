use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::{FileEntry, UploadFormat};

pub(crate) fn resolve_start_dir(last: Option<&str>) -> Result<PathBuf> {
    if let Some(current) = last.filter(|current| !current.trim().is_empty()) {
        let path = PathBuf::from(current);
        if path.is_dir() {
            return Ok(path);
        }
        if let Some(parent) = path.parent().filter(|parent| parent.is_dir()) {
            return Ok(parent.to_path_buf());
        }
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    std::env::current_dir().context("current dir")
}

pub(crate) fn read_dir_entries(dir: &Path, show_hidden: bool) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).context("read dir")? {
        let entry = entry.context("read dir entry")?;
        let path = entry.path();
        let file_type = entry.file_type().context("read file type")?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !show_hidden && name.starts_with('.') {
            continue;
        }
        entries.push(FileEntry {
            name,
            path,
            is_dir: file_type.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(entries)
}

/// Local directory listing with multi-file marks for upload batches.
#[derive(Debug)]
pub(crate) struct LocalBrowser {
    pub(crate) cwd: PathBuf,
    pub(crate) entries: Vec<FileEntry>,
    pub(crate) cursor: usize,
    pub(crate) marked: BTreeSet<PathBuf>,
    pub(crate) show_hidden: bool,
    pub(crate) error: Option<String>,
}

impl LocalBrowser {
    pub(crate) fn new(cwd: PathBuf) -> Self {
        let mut browser = Self {
            cwd,
            entries: vec![],
            cursor: 0,
            marked: BTreeSet::new(),
            show_hidden: false,
            error: None,
        };
        browser.refresh();
        browser
    }

    pub(crate) fn refresh(&mut self) {
        match read_dir_entries(&self.cwd, self.show_hidden) {
            Ok(entries) => {
                self.entries = entries;
                self.error = None;
            }
            Err(err) => {
                self.entries.clear();
                self.error = Some(format!("{err:#}"));
            }
        }
        self.marked.retain(|path| path.exists());
        if self.cursor >= self.entries.len() {
            self.cursor = self.entries.len().saturating_sub(1);
        }
    }

    pub(crate) fn selected(&self) -> Option<&FileEntry> {
        self.entries.get(self.cursor)
    }

    pub(crate) fn move_cursor(&mut self, delta: isize) {
        if self.entries.is_empty() {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, self.entries.len() as isize - 1) as usize;
    }

    fn change_dir(&mut self, dir: PathBuf) {
        self.cwd = dir;
        self.cursor = 0;
        self.marked.clear();
        self.refresh();
    }

    pub(crate) fn enter(&mut self) -> bool {
        match self.selected() {
            Some(entry) if entry.is_dir => {
                let dir = entry.path.clone();
                self.change_dir(dir);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn parent(&mut self) -> bool {
        let Some(parent) = self.cwd.parent().map(Path::to_path_buf) else {
            return false;
        };
        let previous = self.cwd.clone();
        self.change_dir(parent);
        if let Some(index) = self.entries.iter().position(|entry| entry.path == previous) {
            self.cursor = index;
        }
        true
    }

    pub(crate) fn toggle_hidden(&mut self) {
        self.show_hidden = !self.show_hidden;
        self.refresh();
    }

    /// Marks or unmarks the selected file. Directories cannot be marked.
    pub(crate) fn toggle_mark(&mut self) {
        let Some(entry) = self.selected() else {
            return;
        };
        if entry.is_dir {
            return;
        }
        let path = entry.path.clone();
        if !self.marked.remove(&path) {
            self.marked.insert(path);
        }
        self.move_cursor(1);
    }

    /// Marked files in name order, or the selected file when nothing is marked.
    pub(crate) fn selected_files(&self) -> Vec<PathBuf> {
        if !self.marked.is_empty() {
            return self.marked.iter().cloned().collect();
        }
        self.selected()
            .filter(|entry| !entry.is_dir)
            .map(|entry| vec![entry.path.clone()])
            .unwrap_or_default()
    }

    pub(crate) fn is_uploadable(entry: &FileEntry) -> bool {
        !entry.is_dir && UploadFormat::from_path(&entry.path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, LocalBrowser) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.gpkg"), b"").unwrap();
        fs::write(dir.path().join("A.zip"), b"").unwrap();
        fs::write(dir.path().join(".hidden"), b"").unwrap();
        let browser = LocalBrowser::new(dir.path().to_path_buf());
        (dir, browser)
    }

    fn names(browser: &LocalBrowser) -> Vec<&str> {
        browser.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn listing_sorts_case_insensitively_and_hides_dotfiles() {
        let (_dir, mut browser) = fixture();
        assert_eq!(names(&browser), vec!["A.zip", "b.gpkg", "nested"]);
        browser.toggle_hidden();
        assert_eq!(names(&browser), vec![".hidden", "A.zip", "b.gpkg", "nested"]);
    }

    #[test]
    fn marks_drive_selected_files() {
        let (dir, mut browser) = fixture();
        assert_eq!(browser.selected_files(), vec![dir.path().join("A.zip")]);
        browser.toggle_mark();
        browser.toggle_mark();
        browser.toggle_mark();
        assert_eq!(
            browser.selected_files(),
            vec![dir.path().join("A.zip"), dir.path().join("b.gpkg")]
        );
        browser.cursor = 0;
        browser.toggle_mark();
        assert_eq!(browser.selected_files(), vec![dir.path().join("b.gpkg")]);
    }

    #[test]
    fn enter_and_parent_navigate() {
        let (dir, mut browser) = fixture();
        browser.cursor = 2;
        assert!(browser.enter());
        assert_eq!(browser.cwd, dir.path().join("nested"));
        assert!(browser.entries.is_empty());
        assert!(browser.parent());
        assert_eq!(browser.cwd, dir.path());
        assert_eq!(browser.selected().map(|entry| entry.name.as_str()), Some("nested"));
    }

    #[test]
    fn uploadable_follows_format() {
        let (_dir, browser) = fixture();
        let flags: Vec<_> = browser
            .entries
            .iter()
            .map(LocalBrowser::is_uploadable)
            .collect();
        assert_eq!(flags, vec![true, true, false]);
    }
}
